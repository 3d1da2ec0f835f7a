// CAT framing: every command and answer is ASCII terminated by ';'

use super::CatError;
use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

pub const TERMINATOR: u8 = b';';
pub const MAX_ANSWER: usize = 1024;

#[derive(Debug, Default)]
pub struct CatCodec;

impl Decoder for CatCodec {
    type Item = String;
    type Error = CatError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let end = src.as_ref().iter().position(|b| *b == TERMINATOR);
        match end {
            Some(n) if n <= MAX_ANSWER => {
                let answer = src.split_to(n + 1);
                Ok(Some(String::from_utf8_lossy(&answer).into_owned()))
            }
            Some(_) => Err(CatError::Overflow),
            None if src.len() > MAX_ANSWER => Err(CatError::Overflow),
            None => Ok(None),
        }
    }

    // whatever arrived before the port closed is the answer
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(answer) => Ok(Some(answer)),
            None if src.is_empty() => Ok(None),
            None => {
                let rest = src.split();
                Ok(Some(String::from_utf8_lossy(&rest).into_owned()))
            }
        }
    }
}

impl Encoder<String> for CatCodec {
    type Error = CatError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put(item.as_bytes());
        Ok(())
    }
}
