use crate::core::model::MAX_SEQUENCE_LEN;
use anyhow::{Context, Result, anyhow, bail};
use flate2::read::MultiGzDecoder;
use gzp::deflate::{Bgzf, Mgzip};
use gzp::par::decompress::ParDecompressBuilder;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const FLG_FEXTRA: u8 = 0x04;

/// The whole input, resident in memory and immutable.
pub enum Sequence {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Sequence {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Sequence::Mapped(map) => map,
            Sequence::Owned(data) => data,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }
}

/// How the input bytes are stored on disk. Blocked gzip flavours can be
/// inflated on several threads.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputKind {
    Plain,
    Gzip,
    Bgzf,
    Mgzip,
}

impl InputKind {
    pub fn is_compressed(self) -> bool {
        self != InputKind::Plain
    }

    /// Classifies from the first bytes of the file; a `.gz` name without the
    /// magic is still handed to the decoder so it can report the damage.
    fn sniff(header: &[u8], gz_name: bool) -> Self {
        if !header.starts_with(&GZIP_MAGIC) {
            return if gz_name { InputKind::Gzip } else { InputKind::Plain };
        }
        if header.len() >= 14 && header[3] & FLG_FEXTRA != 0 {
            match &header[12..14] {
                b"BC" => return InputKind::Bgzf,
                b"IG" => return InputKind::Mgzip,
                _ => {}
            }
        }
        InputKind::Gzip
    }
}

/// Loads `path` fully, inflating gzip input. Inputs longer than
/// `MAX_SEQUENCE_LEN` bytes are rejected.
pub fn load_sequence(path: &Path, threads: usize) -> Result<(Sequence, InputKind)> {
    let open_err = || format!("unable to open file {}", path.display());
    let mut file = File::open(path).with_context(open_err)?;

    let mut header = [0u8; 16];
    let n = file.read(&mut header).with_context(open_err)?;
    let gz_name = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
    let kind = InputKind::sniff(&header[..n], gz_name);

    if !kind.is_compressed() {
        let len = file.metadata().with_context(open_err)?.len();
        if len > MAX_SEQUENCE_LEN as u64 {
            bail!("the file {} is too long", path.display());
        }
        if len == 0 {
            return Ok((Sequence::Owned(Vec::new()), kind));
        }
        // SAFETY: read-only mapping of a file nothing else in this process writes.
        let map = unsafe { Mmap::map(&file) }
            .with_context(|| format!("mmap failed for {}", path.display()))?;
        return Ok((Sequence::Mapped(map), kind));
    }

    file.rewind().with_context(open_err)?;
    let mut data = Vec::new();
    inflate(file, kind, threads)?
        .take(MAX_SEQUENCE_LEN as u64 + 1)
        .read_to_end(&mut data)
        .with_context(|| format!("gzip decompression error in {}", path.display()))?;
    if data.len() > MAX_SEQUENCE_LEN {
        bail!("the file {} is too long", path.display());
    }
    Ok((Sequence::Owned(data), kind))
}

fn inflate(file: File, kind: InputKind, threads: usize) -> Result<Box<dyn Read + Send>> {
    let reader = BufReader::new(file);
    let decoder: Box<dyn Read + Send> = match kind {
        InputKind::Bgzf if threads > 1 => Box::new(
            ParDecompressBuilder::<Bgzf>::new()
                .num_threads(threads)
                .map_err(|e| anyhow!("BGZF decoder setup: {e}"))?
                .from_reader(reader),
        ),
        InputKind::Mgzip if threads > 1 => Box::new(
            ParDecompressBuilder::<Mgzip>::new()
                .num_threads(threads)
                .map_err(|e| anyhow!("MGZIP decoder setup: {e}"))?
                .from_reader(reader),
        ),
        _ => Box::new(MultiGzDecoder::new(reader)),
    };
    Ok(decoder)
}
