use crate::error::SimError;

/// Engine state machine: `Uninitialized → Ready ⇄ Stepping → Disposed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    Ready,
    Stepping,
    Disposed,
}

impl Lifecycle {
    pub fn as_str(self) -> &'static str {
        match self {
            Lifecycle::Uninitialized => "uninitialized",
            Lifecycle::Ready => "ready",
            Lifecycle::Stepping => "stepping",
            Lifecycle::Disposed => "disposed",
        }
    }

    pub fn ensure_ready(self) -> Result<(), SimError> {
        match self {
            Lifecycle::Ready => Ok(()),
            Lifecycle::Disposed => Err(SimError::Disposed),
            other => Err(SimError::NotReady(other)),
        }
    }

    pub fn begin_step(&mut self) -> Result<(), SimError> {
        self.ensure_ready()?;
        *self = Lifecycle::Stepping;
        Ok(())
    }

    pub fn end_step(&mut self) {
        if *self == Lifecycle::Stepping {
            *self = Lifecycle::Ready;
        }
    }

    #[inline]
    pub fn is_disposed(self) -> bool {
        self == Lifecycle::Disposed
    }
}
