//! Scripted transaction source for executor tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use crate::{Classify, ErrorClass, TransactionHandle, TransactionSource, TxOptions};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fake {0} failure")]
pub(crate) struct FakeError(pub ErrorClass);

impl Classify for FakeError {
    fn classify(&self) -> ErrorClass {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeLog {
    pub begun: u32,
    pub committed: u32,
    pub rolled_back: u32,
    pub options: Vec<TxOptions>,
}

#[derive(Debug, Default)]
struct FakeState {
    log: FakeLog,
    commit_failures: VecDeque<ErrorClass>,
    rollback_fails: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeSource {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next commits fail with the given classes, in order.
    pub fn with_commit_failures(self, classes: impl IntoIterator<Item = ErrorClass>) -> Self {
        self.state.lock().unwrap().commit_failures.extend(classes);
        self
    }

    pub fn with_failing_rollback(self) -> Self {
        self.state.lock().unwrap().rollback_fails = true;
        self
    }

    pub fn log(&self) -> FakeLog {
        self.state.lock().unwrap().log.clone()
    }
}

#[derive(Debug)]
pub(crate) struct FakeTx {
    state: Arc<Mutex<FakeState>>,
    pub statements: u32,
}

#[async_trait]
impl TransactionSource for FakeSource {
    type Tx = FakeTx;

    async fn begin(&self, options: TxOptions) -> Result<FakeTx, FakeError> {
        let mut state = self.state.lock().unwrap();
        state.log.begun += 1;
        state.log.options.push(options);
        Ok(FakeTx {
            state: self.state.clone(),
            statements: 0,
        })
    }
}

#[async_trait]
impl TransactionHandle for FakeTx {
    type Error = FakeError;

    async fn commit(self) -> Result<(), FakeError> {
        let mut state = self.state.lock().unwrap();
        if let Some(class) = state.commit_failures.pop_front() {
            state.log.rolled_back += 1;
            return Err(FakeError(class));
        }
        state.log.committed += 1;
        Ok(())
    }

    async fn rollback(self) -> Result<(), FakeError> {
        let mut state = self.state.lock().unwrap();
        if state.rollback_fails {
            return Err(FakeError(ErrorClass::Permanent));
        }
        state.log.rolled_back += 1;
        Ok(())
    }
}
