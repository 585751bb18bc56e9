use crate::CellKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("attempted to set a non-settable {kind} cell")]
    NotSettable { kind: CellKind },

    #[error("no cell named `{0}` in the store")]
    UnknownKey(String),

    #[error("failed to snapshot `{key}`")]
    Snapshot {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
