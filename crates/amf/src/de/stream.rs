use std::fmt;

use serde::de::SeqAccess;

use crate::Amf0Error;
use crate::decoder::Amf0Decoder;

/// Deserializer stream for AMF0 values.
///
/// This is a stream of AMF0 values that can be deserialized into a type.
#[must_use = "Iterators are lazy and do nothing unless consumed"]
pub struct Amf0DeserializerStream<'a, B, T> {
    de: &'a mut Amf0Decoder<B>,
    _marker: std::marker::PhantomData<T>,
}

impl<'a, B, T> Amf0DeserializerStream<'a, B, T> {
    pub(crate) fn new(de: &'a mut Amf0Decoder<B>) -> Self {
        Self {
            de,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<'de, B, T> Iterator for Amf0DeserializerStream<'_, B, T>
where
    B: bytes::Buf,
    T: serde::de::Deserialize<'de>,
{
    type Item = Result<T, Amf0Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.de.has_remaining() {
            Some(T::deserialize(&mut *self.de))
        } else {
            None
        }
    }
}

impl<'de, B, T> std::iter::FusedIterator for Amf0DeserializerStream<'_, B, T>
where
    B: bytes::Buf,
    T: serde::de::Deserialize<'de>,
{
}

pub(crate) struct MultiValueDe<'a, B> {
    pub(crate) de: &'a mut Amf0Decoder<B>,
}

impl<'de, B> SeqAccess<'de> for MultiValueDe<'_, B>
where
    B: bytes::Buf,
{
    type Error = Amf0Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error>
    where
        T: serde::de::DeserializeSeed<'de>,
    {
        if self.de.has_remaining() {
            seed.deserialize(&mut *self.de).map(Some)
        } else {
            Ok(None)
        }
    }
}

pub(crate) const MULTI_VALUE_NEW_TYPE: &str = "___AMF0_MULTI_VALUE__DO_NOT_USE__";

/// A wrapper around a value that can be deserialized as a series of individual values.
///
/// This is useful if your amf0 encoded data is a series of individual values.
pub struct MultiValue<T>(pub T);

impl<'de, T> serde::de::Deserialize<'de> for MultiValue<T>
where
    T: serde::de::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor<T>(std::marker::PhantomData<T>);

        impl<'de, T> serde::de::Visitor<'de> for Visitor<T>
        where
            T: serde::de::Deserialize<'de>,
        {
            type Value = T;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a series of values")
            }

            fn visit_seq<V>(self, seq: V) -> Result<Self::Value, V::Error>
            where
                V: serde::de::SeqAccess<'de>,
            {
                T::deserialize(serde::de::value::SeqAccessDeserializer::new(seq))
            }
        }

        deserializer
            .deserialize_newtype_struct(MULTI_VALUE_NEW_TYPE, Visitor(std::marker::PhantomData))
            .map(MultiValue)
    }
}
