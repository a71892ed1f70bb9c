use std::collections::VecDeque;

use super::word::Word;
use crate::error::{Error, Result};

/// Blocking read side of a stream.
///
/// `read` returns [`Error::StreamClosed`] once the producer is gone and no
/// words remain.
pub trait StreamSource<W> {
    fn read(&mut self) -> Result<Word<W>>;
}

/// Blocking write side of a stream.
pub trait StreamSink<W> {
    fn write(&mut self, word: Word<W>) -> Result<()>;
}

impl<W, S: StreamSource<W> + ?Sized> StreamSource<W> for &mut S {
    #[inline]
    fn read(&mut self) -> Result<Word<W>> {
        (**self).read()
    }
}

impl<W, S: StreamSink<W> + ?Sized> StreamSink<W> for &mut S {
    #[inline]
    fn write(&mut self, word: Word<W>) -> Result<()> {
        (**self).write(word)
    }
}

impl<W> StreamSource<W> for VecDeque<Word<W>> {
    fn read(&mut self) -> Result<Word<W>> {
        self.pop_front().ok_or(Error::StreamClosed)
    }
}

impl<W> StreamSink<W> for VecDeque<Word<W>> {
    fn write(&mut self, word: Word<W>) -> Result<()> {
        self.push_back(word);
        Ok(())
    }
}

impl<W> StreamSink<W> for Vec<Word<W>> {
    fn write(&mut self, word: Word<W>) -> Result<()> {
        self.push(word);
        Ok(())
    }
}
