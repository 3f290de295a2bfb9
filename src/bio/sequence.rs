use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    pub id: String,
    pub description: Option<String>,
    pub residues: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceType {
    Protein,
    Nucleotide,
}

impl Sequence {
    pub fn new(id: String, residues: Vec<u8>) -> Self {
        Self {
            id,
            description: None,
            residues,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Crude alphabet detection: any residue letter that exists only in the
    /// amino-acid alphabet (never as an IUPAC nucleotide code) marks the
    /// record as protein.
    pub fn detect_type(&self) -> SequenceType {
        let amino_only = |c: u8| {
            matches!(
                c.to_ascii_uppercase(),
                b'E' | b'F' | b'I' | b'L' | b'P' | b'Q' | b'X' | b'Z'
            )
        };

        if self.residues.iter().copied().any(amino_only) {
            SequenceType::Protein
        } else {
            SequenceType::Nucleotide
        }
    }

    pub fn header(&self) -> String {
        match &self.description {
            Some(desc) => format!(">{} {}", self.id, desc),
            None => format!(">{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_with_description() {
        let seq = Sequence::new("seq1".to_string(), b"ACGT".to_vec())
            .with_description("chromosome 1".to_string());
        assert_eq!(seq.header(), ">seq1 chromosome 1");
    }

    #[test]
    fn test_header_without_description() {
        let seq = Sequence::new("seq1".to_string(), b"ACGT".to_vec());
        assert_eq!(seq.header(), ">seq1");
    }

    #[test]
    fn test_detect_type() {
        let dna = Sequence::new("d".to_string(), b"ACGTACGT".to_vec());
        assert_eq!(dna.detect_type(), SequenceType::Nucleotide);

        let protein = Sequence::new("p".to_string(), b"MIYQAKTLQ".to_vec());
        assert_eq!(protein.detect_type(), SequenceType::Protein);
    }
}
