//! Object Serializer: emits bytes for a growing PDF file and
//! maintains the cross-reference table, independent of what the bytes mean.
//! Follows `victor`'s `pdf/object.rs`/`pdf/syntax.rs`, generalized from
//! its fixed three-object scheme to arbitrary `allocate`/`emit`.

pub(crate) mod object;
pub(crate) mod syntax;

pub(crate) use self::object::{Dictionary, Object};
pub(crate) use self::syntax::{IndirectObjectId, PdfVersion, Serializer, SerializerError, StreamFilter, XrefFormat};

impl From<SerializerError> for crate::error::Error {
    fn from(err: SerializerError) -> Self {
        match err {
            SerializerError::InvalidObjectId(id) => crate::error::Error::InvalidObjectId(id),
            SerializerError::Io(err) => crate::error::Error::IoWriteError(err),
        }
    }
}
