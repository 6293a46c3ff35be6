#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use flow_hooks::{HostEngine, Size, time::GameTime};

/// Ordered record of everything that ran during a test, shared between
/// subscribers and the host.
#[derive(Clone, Default)]
pub(crate) struct CallLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries.borrow().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// Host whose base steps only write to the log.
pub(crate) struct RecordingHost {
    log: CallLog,
    pub update_times: Vec<GameTime>,
}

impl RecordingHost {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            update_times: Vec::new(),
        }
    }
}

impl HostEngine for RecordingHost {
    fn initialize(&mut self) -> anyhow::Result<()> {
        self.log.push("base:initialize");
        Ok(())
    }

    fn update(&mut self, time: &GameTime) -> anyhow::Result<()> {
        self.log.push("base:update");
        self.update_times.push(*time);
        Ok(())
    }

    fn draw(&mut self, _: &GameTime) -> anyhow::Result<()> {
        self.log.push("base:draw");
        Ok(())
    }

    fn resize(&mut self, size: Size) -> anyhow::Result<()> {
        self.log
            .push(format!("base:resize {}x{}", size.width, size.height));
        Ok(())
    }

    fn unload(&mut self) -> anyhow::Result<()> {
        self.log.push("base:unload");
        Ok(())
    }
}

pub(crate) fn frame_time(elapsed_ms: u64, total_ms: u64) -> GameTime {
    GameTime::new(
        std::time::Duration::from_millis(elapsed_ms),
        std::time::Duration::from_millis(total_ms),
    )
}
