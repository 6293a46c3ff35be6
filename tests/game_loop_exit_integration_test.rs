#![cfg(feature = "integration-tests")]

mod common;

use flow_hooks::{config::GameConfig, flow::Game};

use crate::common::test_utils::CallLog;

#[test]
fn exit_during_initialize_skips_the_first_tick() {
    let game = Game::new(GameConfig::new(32, 32).with_credits(false));
    let handle = game.handle();
    let log = CallLog::new();

    {
        let log = log.clone();
        let handle = handle.clone();
        game.hub().on_initialize(move || {
            log.push("initialize");
            handle.exit();
            Ok(())
        });
    }
    {
        let log = log.clone();
        game.hub().on_update(move |_| {
            log.push("update");
            Ok(())
        });
    }
    {
        let log = log.clone();
        game.hub().on_draw(move || {
            log.push("draw");
            Ok(())
        });
    }
    {
        let log = log.clone();
        game.hub().on_unload(move || {
            log.push("unload");
            Ok(())
        });
    }

    game.run().unwrap();

    assert_eq!(log.entries(), ["initialize", "unload"]);
}
