// src/readers/linereader.rs

//! Implements [`ForwardLineReader`] and [`ReverseLineReader`], the drivers
//! of deriving raw lines from one accounting log file.
//!
//! Both are finite, single-pass, and not restartable; they mirror a file
//! handle's cursor. The reverse reader is the byte-level algorithm of the
//! whole subsystem: it reads fixed-size blocks from the file tail, finds
//! line boundaries inside each block, and carries the unfinished head
//! fragment across block seams so no line is truncated or duplicated. It
//! never holds more than one block plus one (line-bounded) carry buffer,
//! which is the memory bound the design exists to uphold.
//!
//! [`ForwardLineReader`]: self::ForwardLineReader
//! [`ReverseLineReader`]: self::ReverseLineReader

use crate::common::{Bytes, Count, CRu8, FPath, File, FileOffset, NLu8, Path, ResultS3};

use std::io::{BufRead, BufReader, Error, ErrorKind, Read, Seek, SeekFrom};

use ::memchr::memchr_iter;
#[allow(unused_imports)]
use ::more_asserts::{debug_assert_ge, debug_assert_le};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// blocks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Read-block size in bytes for the [`ReverseLineReader`].
///
/// [`ReverseLineReader`]: self::ReverseLineReader
pub type BlockSz = usize;

pub const BLOCKSZ_DEFAULT: BlockSz = 0x10000;
pub const BLOCKSZ_MIN: BlockSz = 1;

/// A typed [`ResultS3`] for the `next_line` functions.
///
/// The `Found` value is one line, without its trailing newline.
///
/// [`ResultS3`]: crate::common::ResultS3
pub type ResultLineRead = ResultS3<Bytes, Error>;

/// Strip one trailing newline and any trailing carriage return.
fn chomp(line: &mut Bytes) {
    if line.last() == Some(&NLu8) {
        line.pop();
    }
    if line.last() == Some(&CRu8) {
        line.pop();
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ForwardLineReader
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Yields the lines of one file top-to-bottom with buffered sequential
/// I/O. Owns the file handle exclusively; the handle is released when the
/// reader is dropped, exhausted or not.
pub struct ForwardLineReader {
    path: FPath,
    reader: BufReader<File>,
    /// `Count` of lines yielded (blank lines are skipped, not counted).
    pub(crate) lines_read: Count,
}

impl ForwardLineReader {
    pub fn open(path: &FPath) -> Result<ForwardLineReader, Error> {
        defñ!("({:?})", path);
        let file: File = File::open(Path::new(path.as_str()))?;

        Ok(ForwardLineReader {
            path: path.clone(),
            reader: BufReader::new(file),
            lines_read: 0,
        })
    }

    pub fn path(&self) -> &FPath {
        &self.path
    }

    /// Produce the next line or signal exhaustion. Blank lines are
    /// skipped.
    pub fn next_line(&mut self) -> ResultLineRead {
        loop {
            let mut buf: Bytes = Bytes::new();
            match self
                .reader
                .read_until(NLu8, &mut buf)
            {
                Ok(0) => return ResultS3::Done,
                Ok(_) => {
                    chomp(&mut buf);
                    if buf.is_empty() {
                        continue;
                    }
                    self.lines_read += 1;

                    return ResultS3::Found(buf);
                }
                Err(err) => return ResultS3::Err(err),
            }
        }
    }
}

impl std::fmt::Debug for ForwardLineReader {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ForwardLineReader")
            .field("path", &self.path)
            .field("lines_read", &self.lines_read)
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ReverseLineReader
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Yields the lines of one file bottom-to-top without loading the file
/// into memory: the exact reverse of the [`ForwardLineReader`] sequence,
/// for every block-size choice.
///
/// Blocks of `blocksz` bytes are read backward from the file tail.
/// Complete lines inside the read region go to `pending` (yielded
/// newest-first); the bytes before the region's first newline become
/// `carry`, the head fragment of a line whose beginning lies in a block
/// not yet read.
///
/// Invariant: `carry` always ends at a known line-start boundary, so the
/// tail segment after the last newline of a freshly-read block is always
/// a complete line.
///
/// [`ForwardLineReader`]: self::ForwardLineReader
pub struct ReverseLineReader {
    path: FPath,
    file: File,
    blocksz: BlockSz,
    /// Lowest `FileOffset` read so far; bytes below this are unread.
    /// The next block read ends here.
    pos: FileOffset,
    /// Head fragment of the line straddling `pos`, possibly longer than
    /// one block for very long lines.
    carry: Bytes,
    /// Complete lines found but not yet yielded, in file order;
    /// popped from the back, newest first.
    pending: Vec<Bytes>,
    /// `Count` of lines yielded (blank lines are skipped, not counted).
    pub(crate) lines_read: Count,
}

impl ReverseLineReader {
    pub fn open(
        path: &FPath,
        blocksz: BlockSz,
    ) -> Result<ReverseLineReader, Error> {
        defn!("({:?}, blocksz {})", path, blocksz);
        if blocksz < BLOCKSZ_MIN {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("blocksz {} is less than minimum {}", blocksz, BLOCKSZ_MIN),
            ));
        }
        let file: File = File::open(Path::new(path.as_str()))?;
        let filesz: FileOffset = file.metadata()?.len();
        defx!("filesz {}", filesz);

        Ok(ReverseLineReader {
            path: path.clone(),
            file,
            blocksz,
            pos: filesz,
            carry: Bytes::new(),
            pending: Vec::new(),
            lines_read: 0,
        })
    }

    pub fn path(&self) -> &FPath {
        &self.path
    }

    /// Produce the next line (most recent first) or signal exhaustion.
    /// Blank lines are skipped, matching the forward reader.
    pub fn next_line(&mut self) -> ResultLineRead {
        loop {
            if let Some(mut line) = self.pending.pop() {
                chomp(&mut line);
                if line.is_empty() {
                    continue;
                }
                self.lines_read += 1;

                return ResultS3::Found(line);
            }
            if self.pos == 0 {
                // the carry is now the first line of the file
                if self.carry.is_empty() {
                    return ResultS3::Done;
                }
                let mut line: Bytes = std::mem::take(&mut self.carry);
                chomp(&mut line);
                if line.is_empty() {
                    return ResultS3::Done;
                }
                self.lines_read += 1;

                return ResultS3::Found(line);
            }
            if let ResultS3::Err(err) = self.read_prior_block() {
                return ResultS3::Err(err);
            }
        }
    }

    /// Read the block preceding `pos` and split it into `pending` lines
    /// and a new `carry`.
    fn read_prior_block(&mut self) -> ResultS3<(), Error> {
        debug_assert_ge!(self.pos, 1, "read_prior_block called at file offset 0");
        let readsz: usize = std::cmp::min(self.blocksz as u64, self.pos) as usize;
        let seek_to: FileOffset = self.pos - readsz as u64;
        defn!("blocksz {}, seek({}), read {} bytes", self.blocksz, seek_to, readsz);
        if let Err(err) = self
            .file
            .seek(SeekFrom::Start(seek_to))
        {
            return ResultS3::Err(err);
        }
        let mut block: Bytes = vec![0u8; readsz];
        if let Err(err) = self
            .file
            .read_exact(&mut block)
        {
            return ResultS3::Err(err);
        }
        self.pos = seek_to;

        // the new block precedes the carry; scan them as one region
        let mut full: Bytes = block;
        full.append(&mut self.carry);
        let nl_offsets: Vec<usize> = memchr_iter(NLu8, &full).collect();
        match nl_offsets.first() {
            None => {
                // no boundary in the region; the whole of it is carry
                self.carry = full;
            }
            Some(first_nl) => {
                let mut at: usize = first_nl + 1;
                for nl in nl_offsets[1..].iter() {
                    self.pending
                        .push(full[at..*nl].to_vec());
                    at = *nl + 1;
                }
                // tail segment after the last newline; complete per the
                // carry invariant (empty when the region ends in '\n')
                self.pending
                    .push(full[at..].to_vec());
                full.truncate(*first_nl);
                self.carry = full;
            }
        }
        defx!("pos {}, carry {} bytes, pending {} lines", self.pos, self.carry.len(), self.pending.len());

        ResultS3::Found(())
    }
}

impl std::fmt::Debug for ReverseLineReader {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ReverseLineReader")
            .field("path", &self.path)
            .field("blocksz", &self.blocksz)
            .field("pos", &self.pos)
            .field("lines_read", &self.lines_read)
            .finish()
    }
}
