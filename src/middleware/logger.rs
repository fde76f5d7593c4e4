//! Logging [Middleware] which publishes every action passing through
//! the [Store](crate::Store), along with the state before and after
//! it, using the [log] crate.

use crate::{
    middleware::{Middleware, MiddlewareApi},
    Action, Dispatch, Result,
};
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Warn,
    Info,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
        }
    }
}

#[derive(Debug, Default)]
pub struct LoggerMiddleware {
    log_level: LogLevel,
}

impl LoggerMiddleware {
    pub fn new() -> Self {
        LoggerMiddleware {
            log_level: LogLevel::default(),
        }
    }

    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }
}

impl<State, A> Middleware<State, A> for LoggerMiddleware
where
    State: Debug + 'static,
    A: Action + Debug + 'static,
{
    fn on_dispatch(
        &self,
        api: &MiddlewareApi<State, A>,
        action: A,
        next: &Dispatch<A>,
    ) -> Result<A> {
        let level = log::Level::from(self.log_level);
        if let Ok(state) = api.get_state() {
            log::log!(level, "prev state: {:?}", state);
        }
        log::log!(level, "action: {:?}", action);

        match next.dispatch(action) {
            Ok(action) => {
                if let Ok(state) = api.get_state() {
                    log::log!(level, "next state: {:?}", state);
                }
                Ok(action)
            }
            Err(error) => {
                log::log!(level, "dispatch failed: {}", error);
                Err(error)
            }
        }
    }
}
