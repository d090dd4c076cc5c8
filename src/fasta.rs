use anyhow::Result;
use needletail::parse_fastx_file;
use noodles::fasta;
use crate::types::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Viral reference sequences, in file order. Record ids double as the
/// viral "chromosome" names used in the alignment header.
#[derive(Debug, Default)]
pub struct ViralReferences {
    ids: Vec<String>,
    seqs: HashMap<String, Vec<u8>>,
}

impl ViralReferences {
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = parse_fastx_file(path)
            .map_err(|e| anyhow::anyhow!("failed to open FASTA {}: {}", path.display(), e))?;
        let mut refs = Self::default();

        while let Some(result) = reader.next() {
            let record = result
                .map_err(|e| anyhow::anyhow!("failed to parse FASTA record: {}", e))?;
            // Only the first whitespace-delimited token is the id.
            let header = String::from_utf8_lossy(record.id()).to_string();
            let name = header.split_whitespace().next().unwrap_or("").to_string();
            let seq = record.seq().to_ascii_uppercase();
            refs.insert(name, seq);
        }

        Ok(refs)
    }

    pub fn insert(&mut self, id: impl Into<String>, seq: Vec<u8>) {
        let id = id.into();
        if self.seqs.insert(id.clone(), seq).is_none() {
            self.ids.push(id);
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seqs.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&[u8]> {
        self.seqs.get(id).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Write `(id, sequence)` pairs as FASTA. Returns the number of records.
pub fn write_fasta<'a, I>(path: &Path, records: I) -> Result<usize>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut buf = BufWriter::new(File::create(path)?);
    let mut writer = fasta::io::Writer::new(&mut buf);
    let mut n = 0usize;
    for (id, seq) in records {
        let definition = fasta::record::Definition::new(id, None);
        let sequence = fasta::record::Sequence::from(seq.to_vec());
        writer.write_record(&fasta::Record::new(definition, sequence))?;
        n += 1;
    }
    drop(writer);
    buf.flush()?;
    Ok(n)
}
