//! Parser for Tesseract's TSV output.
//!
//! Columns: `level page_num block_num par_num line_num word_num left top width
//! height conf text`. Only word rows (level 5) with text are kept; confidence is
//! rescaled from 0..100 to 0..1.

use crate::detect::result::TextDetection;
use crate::region::RawGeometry;

const WORD_LEVEL: &str = "5";
const COLUMNS: usize = 12;

pub fn parse_tsv(tsv: &str) -> Vec<TextDetection> {
    tsv.lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < COLUMNS || fields[0] != WORD_LEVEL {
                return None;
            }
            let text = fields[11..].join("\t");
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            let numbers: Option<Vec<f64>> = fields[6..10]
                .iter()
                .map(|field| field.trim().parse::<f64>().ok())
                .collect();
            let confidence = fields[10].trim().parse::<f32>().ok()?;
            // Malformed geometry is passed through as missing and rejected downstream.
            let geometry = numbers.map(|n| RawGeometry::quad(n[0], n[1], n[2], n[3]));
            Some(TextDetection {
                geometry,
                text: text.to_string(),
                confidence: (confidence / 100.0).clamp(0.0, 1.0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_word_rows_only() {
        let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
                   1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t\n\
                   4\t1\t1\t1\t1\t0\t40\t40\t20\t20\t-1\t\n\
                   5\t1\t1\t1\t1\t1\t40\t40\t20\t20\t91.5\t1O5\n\
                   5\t1\t1\t1\t1\t2\t80\t40\t10\t20\t35\t \n\
                   5\t1\t1\t1\t1\t3\tx\t40\t10\t20\t60\tBLK\n";
        let hits = parse_tsv(tsv);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "1O5");
        assert!((hits[0].confidence - 0.915).abs() < 1e-6);
        assert_eq!(
            hits[0].geometry,
            Some(RawGeometry::quad(40.0, 40.0, 20.0, 20.0))
        );
        assert_eq!(hits[1].text, "BLK");
        assert_eq!(hits[1].geometry, None);
    }

    #[test]
    fn empty_output_yields_nothing() {
        assert!(parse_tsv("").is_empty());
    }
}
