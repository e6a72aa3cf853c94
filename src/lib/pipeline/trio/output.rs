//! Result sinks: the tab-separated table and an annotation-ready VCF.

use log::info;
use once_cell::sync::Lazy;
use rust_htslib::bcf::{self, record::GenotypeAllele, Format};
use std::fmt::Display;
use std::io::Write;
use std::path::Path;

use super::result::{DeNovoResult, SampleSummary, TrioIds};
use crate::core::error::Result;
use crate::engine::allele::PileAllele;
use crate::engine::reads::SequenceDictionary;

/// Site-level columns, in output order.
pub const SITE_COLUMNS: &[&str] = &[
    "chr",
    "position",
    "ref_allele",
    "alt_allele",
    "allele1",
    "allele2",
    "dn_allele",
    "dn_is_ref",
    "biallelic_heterozygote",
    "de_novo",
    "super_novo",
    "non_super_novo_reason",
    "mean_haplotype_concordance",
    "overlapping_reads_het_count",
    "overlapping_reads_discordant_het_count",
    "overlapping_reads_adjacent_de_novo_count",
    "overlapping_reads_independent_de_novo_count",
    "overlapping_reads_third_allele_count",
];

/// Per-sample columns, repeated for the child and both parents under a sample prefix.
pub const SAMPLE_COLUMNS: &[&str] = &[
    "id",
    "raw_depth",
    "ref_raw_depth",
    "alt_raw_depth",
    "a1_raw_depth",
    "a2_raw_depth",
    "a_raw_depth",
    "t_raw_depth",
    "c_raw_depth",
    "g_raw_depth",
    "a1_clipped_reads",
    "a2_clipped_reads",
    "a1_last_read_position",
    "a2_last_read_position",
    "a1_apparent_mismap_reads",
    "a2_apparent_mismap_reads",
    "a1_unmapped_mate_reads",
    "a2_unmapped_mate_reads",
    "weighted_depth",
    "ref_weighted_depth",
    "alt_weighted_depth",
    "a1_weighted_depth",
    "a2_weighted_depth",
    "a_weighted_depth",
    "t_weighted_depth",
    "c_weighted_depth",
    "g_weighted_depth",
];

pub const SAMPLE_PREFIXES: [&str; 3] = ["child", "p1", "p2"];

const MISSING: &str = ".";

fn opt<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

static HEADER: Lazy<Vec<String>> = Lazy::new(|| {
    let mut columns: Vec<String> = SITE_COLUMNS.iter().map(|c| c.to_string()).collect();
    for prefix in SAMPLE_PREFIXES {
        columns.extend(SAMPLE_COLUMNS.iter().map(|c| format!("{}_{}", prefix, c)));
    }
    columns
});

/// Full header row.
pub fn header() -> &'static [String] {
    &HEADER
}

fn sample_fields(sample: &SampleSummary, row: &mut Vec<String>) {
    row.push(sample.id.clone());
    row.push(sample.raw_depth.to_string());
    row.push(sample.ref_raw_depth.to_string());
    row.push(opt(sample.alt_raw_depth));
    row.push(sample.a1_raw_depth.to_string());
    row.push(sample.a2_raw_depth.to_string());
    row.extend(sample.base_raw_depths.iter().map(|d| d.to_string()));
    row.push(sample.a1_clipped.to_string());
    row.push(sample.a2_clipped.to_string());
    row.push(sample.a1_last_position.to_string());
    row.push(sample.a2_last_position.to_string());
    row.push(sample.a1_apparent_mismap.to_string());
    row.push(sample.a2_apparent_mismap.to_string());
    row.push(sample.a1_unmapped_mate.to_string());
    row.push(sample.a2_unmapped_mate.to_string());
    row.push(sample.weighted_depth.to_string());
    row.push(sample.ref_weighted_depth.to_string());
    row.push(opt(sample.alt_weighted_depth));
    row.push(sample.a1_weighted_depth.to_string());
    row.push(sample.a2_weighted_depth.to_string());
    row.extend(sample.base_weighted_depths.iter().map(|d| d.to_string()));
}

/// One table row; absent values are written as `.`.
pub fn row(result: &DeNovoResult) -> Vec<String> {
    let position = result.reference.position();
    let haplotype = &result.haplotype;
    let mut row = vec![
        position.contig().to_string(),
        position.position().to_string(),
        result.reference.ref_allele().to_string(),
        opt(result.reference.alt_allele()),
        opt(result.allele1.as_ref()),
        opt(result.allele2.as_ref()),
        opt(result.de_novo_allele.as_ref()),
        opt(result.de_novo_is_ref),
        result.biallelic_heterozygote.to_string(),
        result.de_novo.to_string(),
        result.super_novo.to_string(),
        result.non_super_novo_reason.to_string(),
        result.mean_haplotype_concordance().to_string(),
        haplotype.concordances.len().to_string(),
        haplotype.discordant_count().to_string(),
        haplotype.adjacent_de_novos.to_string(),
        haplotype.other_de_novos.to_string(),
        haplotype.other_triallelics.to_string(),
    ];
    for sample in [&result.child, &result.parent1, &result.parent2] {
        sample_fields(sample, &mut row);
    }
    row
}

/// Write the header and one row per result.
pub fn write_table<W: Write>(writer: &mut csv::Writer<W>, results: &[DeNovoResult]) -> Result<()> {
    writer.write_record(header())?;
    for result in results {
        writer.write_record(row(result))?;
    }
    writer.flush()?;
    Ok(())
}

/// The alternate allele used for the VCF record: the known one, else the child's non-reference
/// main allele.
fn vcf_alt(result: &DeNovoResult) -> Option<&PileAllele> {
    result.reference.alt_allele().or_else(|| {
        [result.allele1.as_ref(), result.allele2.as_ref()]
            .into_iter()
            .flatten()
            .find(|a| *a != result.reference.ref_allele())
    })
}

/// Write `results` as VCF in dictionary order.
///
/// The child is genotyped ref/alt and both parents ref/ref; `DENOVO` and `SUPERNOVO` are INFO
/// flags.
pub fn write_vcf<P: AsRef<Path>>(
    path: P,
    dictionary: &SequenceDictionary,
    ids: &TrioIds,
    results: &[DeNovoResult],
) -> Result<()> {
    let mut header = bcf::Header::new();
    header.push_record(br#"##source=supernovo"#);
    for (name, length) in dictionary.iter() {
        header.push_record(format!("##contig=<ID={},length={}>", name, length).as_bytes());
    }
    header.push_record(
        br#"##INFO=<ID=DENOVO,Number=0,Type=Flag,Description="Child allele absent from both parents">"#,
    );
    header.push_record(
        br#"##INFO=<ID=SUPERNOVO,Number=0,Type=Flag,Description="De novo call passing haplotype checks">"#,
    );
    header.push_record(br#"##FORMAT=<ID=GT,Number=1,Type=String,Description="Genotype">"#);
    for id in [&ids.child, &ids.parent1, &ids.parent2] {
        header.push_sample(id.as_bytes());
    }

    let mut ordered: Vec<&DeNovoResult> = results.iter().collect();
    ordered.sort_by_key(|r| {
        let position = r.reference.position();
        (dictionary.rank(position.contig()), position.position())
    });

    let mut writer = bcf::Writer::from_path(path.as_ref(), &header, true, Format::Vcf)?;
    for result in ordered {
        let position = result.reference.position();
        let rid = writer.header().name2rid(position.contig().as_bytes())?;
        let mut record = writer.empty_record();
        record.set_rid(Some(rid));
        record.set_pos(i64::from(position.position()) - 1);

        let ref_allele = result.reference.ref_allele().to_string();
        let alt_allele = vcf_alt(result).map(|a| a.to_string());
        let mut alleles = vec![ref_allele.as_bytes()];
        alleles.extend(alt_allele.as_deref().map(str::as_bytes));
        record.set_alleles(&alleles)?;

        let child_alt = if alt_allele.is_some() { 1 } else { 0 };
        record.push_genotypes(&[
            GenotypeAllele::Unphased(0),
            GenotypeAllele::Unphased(child_alt),
            GenotypeAllele::Unphased(0),
            GenotypeAllele::Unphased(0),
            GenotypeAllele::Unphased(0),
            GenotypeAllele::Unphased(0),
        ])?;
        if result.de_novo {
            record.push_info_flag(b"DENOVO")?;
        }
        if result.super_novo {
            record.push_info_flag(b"SUPERNOVO")?;
        }
        writer.write(&record)?;
    }
    info!(
        "Wrote {} records to {}",
        results.len(),
        path.as_ref().display()
    );
    Ok(())
}
