/// Script construction error.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Push of {0} bytes exceeds the maximum push size")]
    PushSize(usize),
}
