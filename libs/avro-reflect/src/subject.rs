//! What a Rust type can offer the codec selector.
//!
//! A type participates by implementing [`AvroSubject`]: as a custom
//! marshaler (it writes its own record bytes), as a text value for string and
//! bytes schemas, or as a reflective message (the engine walks it field by
//! field). The macros at the bottom cover the usual cases.

use avro_wire::{RecordMarshaler, RecordUnmarshaler, TextMarshaler, TextUnmarshaler};
use prost_reflect::{DynamicMessage, ReflectMessage};

use crate::CodecError;

/// Which codec strategies a type supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Can encode itself through [`RecordMarshaler`].
    pub marshal: bool,
    /// Can decode itself through [`RecordUnmarshaler`].
    pub unmarshal: bool,
    /// Can encode itself through [`TextMarshaler`].
    pub text_marshal: bool,
    /// Can decode itself through [`TextUnmarshaler`].
    pub text_unmarshal: bool,
    /// Exposes a reflective message view.
    pub message: bool,
}

/// Callback that receives a message view for encoding.
pub type MessageFn<'a> = dyn FnMut(&DynamicMessage) -> Result<(), CodecError> + 'a;

/// Callback that receives a message view for decoding.
pub type MessageMutFn<'a> = dyn FnMut(&mut DynamicMessage) -> Result<(), CodecError> + 'a;

/// A value the codec selector knows how to bind.
///
/// Methods that a type's [`Capabilities`] does not claim are never called by
/// the engine; their defaults report the capability as missing.
pub trait AvroSubject: 'static {
    fn capabilities() -> Capabilities
    where
        Self: Sized;

    /// An absent top-level value (`None`).
    fn is_nil(&self) -> bool {
        false
    }

    fn as_marshaler(&self) -> Option<&dyn RecordMarshaler> {
        None
    }

    /// Decode target. Implementations with an absent state allocate here.
    fn as_unmarshaler(&mut self) -> Option<&mut dyn RecordUnmarshaler> {
        None
    }

    fn as_text_marshaler(&self) -> Option<&dyn TextMarshaler> {
        None
    }

    /// Text decode target. Allocates an absent value like
    /// [`as_unmarshaler`](Self::as_unmarshaler).
    fn as_text_unmarshaler(&mut self) -> Option<&mut dyn TextUnmarshaler> {
        None
    }

    /// Runs `f` against a message view of `self`.
    fn with_message(&self, f: &mut MessageFn<'_>) -> Result<(), CodecError> {
        let _ = f;
        Err(CodecError::NotAMessage(std::any::type_name::<Self>()))
    }

    /// Runs `f` against a mutable message view of `self`, allocating an
    /// absent value first. Changes made by `f` are visible on `self`
    /// afterwards if `f` succeeds.
    fn with_message_mut(&mut self, f: &mut MessageMutFn<'_>) -> Result<(), CodecError> {
        let _ = f;
        Err(CodecError::NotAMessage(std::any::type_name::<Self>()))
    }
}

impl AvroSubject for DynamicMessage {
    fn capabilities() -> Capabilities {
        Capabilities { message: true, ..Capabilities::default() }
    }

    fn with_message(&self, f: &mut MessageFn<'_>) -> Result<(), CodecError> {
        f(self)
    }

    fn with_message_mut(&mut self, f: &mut MessageMutFn<'_>) -> Result<(), CodecError> {
        f(self)
    }
}

/// `None` encodes as nothing through a marshaler, as empty text through a
/// text marshaler and as an error through the message codec. Decoding into
/// `None` fills it with `T::default()` first.
impl<T: AvroSubject + Default> AvroSubject for Option<T> {
    fn capabilities() -> Capabilities {
        T::capabilities()
    }

    fn is_nil(&self) -> bool {
        self.as_ref().is_none_or(T::is_nil)
    }

    fn as_marshaler(&self) -> Option<&dyn RecordMarshaler> {
        self.as_ref().and_then(T::as_marshaler)
    }

    fn as_unmarshaler(&mut self) -> Option<&mut dyn RecordUnmarshaler> {
        self.get_or_insert_with(T::default).as_unmarshaler()
    }

    fn as_text_marshaler(&self) -> Option<&dyn TextMarshaler> {
        self.as_ref().and_then(T::as_text_marshaler)
    }

    fn as_text_unmarshaler(&mut self) -> Option<&mut dyn TextUnmarshaler> {
        self.get_or_insert_with(T::default).as_text_unmarshaler()
    }

    fn with_message(&self, f: &mut MessageFn<'_>) -> Result<(), CodecError> {
        match self {
            Some(value) => value.with_message(f),
            None => Err(CodecError::NilMessage),
        }
    }

    fn with_message_mut(&mut self, f: &mut MessageMutFn<'_>) -> Result<(), CodecError> {
        self.get_or_insert_with(T::default).with_message_mut(f)
    }
}

impl<T: AvroSubject> AvroSubject for Box<T> {
    fn capabilities() -> Capabilities {
        T::capabilities()
    }

    fn is_nil(&self) -> bool {
        (**self).is_nil()
    }

    fn as_marshaler(&self) -> Option<&dyn RecordMarshaler> {
        (**self).as_marshaler()
    }

    fn as_unmarshaler(&mut self) -> Option<&mut dyn RecordUnmarshaler> {
        (**self).as_unmarshaler()
    }

    fn as_text_marshaler(&self) -> Option<&dyn TextMarshaler> {
        (**self).as_text_marshaler()
    }

    fn as_text_unmarshaler(&mut self) -> Option<&mut dyn TextUnmarshaler> {
        (**self).as_text_unmarshaler()
    }

    fn with_message(&self, f: &mut MessageFn<'_>) -> Result<(), CodecError> {
        (**self).with_message(f)
    }

    fn with_message_mut(&mut self, f: &mut MessageMutFn<'_>) -> Result<(), CodecError> {
        (**self).with_message_mut(f)
    }
}

/// Message view of a generated type, by transcoding.
#[doc(hidden)]
pub fn with_reflected<T: ReflectMessage>(
    value: &T,
    f: &mut MessageFn<'_>,
) -> Result<(), CodecError> {
    f(&value.transcode_to_dynamic())
}

/// Mutable message view of a generated type. `value` is replaced only when
/// `f` succeeds, so a failed decode leaves it untouched.
#[doc(hidden)]
pub fn with_reflected_mut<T: ReflectMessage + Default>(
    value: &mut T,
    f: &mut MessageMutFn<'_>,
) -> Result<(), CodecError> {
    let mut message = value.transcode_to_dynamic();
    f(&mut message)?;
    *value = message.transcode_to::<T>()?;
    Ok(())
}

/// Implements [`AvroSubject`] for a type that marshals itself.
///
/// ```ignore
/// marshaled_subject!(Person);             // RecordMarshaler + RecordUnmarshaler
/// marshaled_subject!(Ticket, marshal);    // encode only
/// marshaled_subject!(Receipt, unmarshal); // decode only
/// ```
#[macro_export]
macro_rules! marshaled_subject {
    ($ty:ty) => {
        impl $crate::AvroSubject for $ty {
            fn capabilities() -> $crate::Capabilities {
                $crate::Capabilities { marshal: true, unmarshal: true, ..Default::default() }
            }

            fn as_marshaler(&self) -> Option<&dyn $crate::RecordMarshaler> {
                Some(self)
            }

            fn as_unmarshaler(&mut self) -> Option<&mut dyn $crate::RecordUnmarshaler> {
                Some(self)
            }
        }
    };
    ($ty:ty, marshal) => {
        impl $crate::AvroSubject for $ty {
            fn capabilities() -> $crate::Capabilities {
                $crate::Capabilities { marshal: true, ..Default::default() }
            }

            fn as_marshaler(&self) -> Option<&dyn $crate::RecordMarshaler> {
                Some(self)
            }
        }
    };
    ($ty:ty, unmarshal) => {
        impl $crate::AvroSubject for $ty {
            fn capabilities() -> $crate::Capabilities {
                $crate::Capabilities { unmarshal: true, ..Default::default() }
            }

            fn as_unmarshaler(&mut self) -> Option<&mut dyn $crate::RecordUnmarshaler> {
                Some(self)
            }
        }
    };
}

/// Implements [`AvroSubject`] for a type carried as text
/// ([`TextMarshaler`] + [`TextUnmarshaler`]).
#[macro_export]
macro_rules! text_subject {
    ($ty:ty) => {
        impl $crate::AvroSubject for $ty {
            fn capabilities() -> $crate::Capabilities {
                $crate::Capabilities {
                    text_marshal: true,
                    text_unmarshal: true,
                    ..Default::default()
                }
            }

            fn as_text_marshaler(&self) -> Option<&dyn $crate::TextMarshaler> {
                Some(self)
            }

            fn as_text_unmarshaler(&mut self) -> Option<&mut dyn $crate::TextUnmarshaler> {
                Some(self)
            }
        }
    };
}

/// Implements [`AvroSubject`] for a generated protobuf type
/// (`prost::Message + prost_reflect::ReflectMessage + Default`).
#[macro_export]
macro_rules! reflected_subject {
    ($ty:ty) => {
        impl $crate::AvroSubject for $ty {
            fn capabilities() -> $crate::Capabilities {
                $crate::Capabilities { message: true, ..Default::default() }
            }

            fn with_message(&self, f: &mut $crate::MessageFn<'_>) -> Result<(), $crate::CodecError> {
                $crate::subject::with_reflected(self, f)
            }

            fn with_message_mut(
                &mut self,
                f: &mut $crate::MessageMutFn<'_>,
            ) -> Result<(), $crate::CodecError> {
                $crate::subject::with_reflected_mut(self, f)
            }
        }
    };
}
