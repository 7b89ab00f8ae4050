#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use smol_str::SmolStr;

use genokit::{
    cli::{GenomeArgs, OrthologArgs},
    genome::{parse_gff, run_genome, GenomeStats, Prodigal},
    orthologs::{run_orthologs, Diamond},
};

const GENOME: &str = ">chr\nATGAAATAGCCCTTACATTTTCATGGGAAA\n";
const GFF: &str = "##gff-version  3\n\
chr\tProdigal_v2.6.3\tCDS\t1\t9\t3.1\t+\t0\tID=1_1;partial=00;start_type=ATG;rbs_motif=None\n\
chr\tProdigal_v2.6.3\tCDS\t13\t24\t2.0\t-\t0\tID=1_2;partial=10;start_type=Edge;rbs_motif=None\n";

/// Writes an executable shell script named `name` into `dir`.
fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();

    let mut permissions = std::fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).unwrap();

    path
}

/// Fake prodigal printing a fixed GFF to `-o` or to stdout.
fn fake_prodigal(dir: &Path) -> PathBuf {
    script(
        dir,
        "prodigal",
        &format!(
            "out=\"\"\n\
             while [ $# -gt 0 ]; do\n\
             case \"$1\" in\n\
             -o) out=\"$2\"; shift ;;\n\
             esac\n\
             shift\n\
             done\n\
             gff() {{\n\
             cat <<'END'\n\
             {GFF}END\n\
             }}\n\
             if [ -n \"$out\" ]; then gff > \"$out\"; else gff; fi\n"
        ),
    )
}

fn hit(q: &str, s: &str, bitscore: f64) -> String {
    format!("{q}\\t{s}\\t95.0\\t100\\t5\\t0\\t1\\t100\\t1\\t100\\t1e-50\\t{bitscore}\\n")
}

#[test]
fn test_failing_diamond_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let diamond = script(dir.path(), "diamond", "exit 1\n");

    let faa = dir.path().join("a.faa");
    std::fs::write(&faa, ">a\nMKV\n").unwrap();

    let err = Diamond::new(diamond.to_str().unwrap(), None)
        .blastp(&faa, &faa, &dir.path().join("hits.tsv"))
        .unwrap_err();
    assert!(err.to_string().contains("diamond blastp failed"));
}

#[test]
fn test_missing_diamond_names_the_executable() {
    let dir = tempfile::tempdir().unwrap();
    let faa = dir.path().join("a.faa");
    std::fs::write(&faa, ">a\nMKV\n").unwrap();

    let err = Diamond::new("/nonexistent/diamond", None)
        .blastp(&faa, &faa, &dir.path().join("hits.tsv"))
        .unwrap_err();
    assert!(err.to_string().contains("/nonexistent/diamond"));
}

#[test]
fn test_orthologs_run_diamond_both_ways() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    let proteomes = dir.path().join("proteomes");
    let outdir = dir.path().join("out");
    std::fs::create_dir_all(&bin).unwrap();
    std::fs::create_dir_all(&proteomes).unwrap();

    let target = proteomes.join("ecoli.faa");
    std::fs::write(&target, ">e1\nMKV\n>e2\nMAA\n").unwrap();
    std::fs::write(proteomes.join("bsub.faa"), ">b1\nMKV\n>b2\nMAA\n").unwrap();

    // INFO: $5 is the query, $7 the output table
    let calls = dir.path().join("calls.log");
    let diamond = script(
        &bin,
        "diamond",
        &format!(
            "echo \"$@\" >> '{}'\n\
             case \"$5\" in\n\
             *ecoli.faa) printf '{}{}' > \"$7\" ;;\n\
             *) printf '{}{}' > \"$7\" ;;\n\
             esac\n",
            calls.display(),
            hit("e1", "b1", 200.0),
            hit("e2", "b1", 100.0),
            hit("b1", "e1", 210.0),
            hit("b2", "e1", 90.0),
        ),
    );

    let output = dir.path().join("reciprocal.tsv");
    run_orthologs(OrthologArgs {
        target,
        proteomes,
        outdir: outdir.clone(),
        output: Some(output.clone()),
        diamond: diamond.to_str().unwrap().to_string(),
        evalue: 1e-20,
        diamond_threads: Some(3),
        precomputed: false,
    })
    .unwrap();

    assert!(outdir.join("ecoli_v_bsub.tsv").exists());
    assert!(outdir.join("bsub_v_ecoli.tsv").exists());
    assert_eq!(
        std::fs::read_to_string(output).unwrap(),
        "protein\tbsub\ne1\tb1\ne2\tno reciprocal\n"
    );

    let calls = std::fs::read_to_string(calls).unwrap();
    assert_eq!(calls.lines().count(), 2);
    assert!(calls.lines().all(|call| call.starts_with("blastp -d ")));
    assert!(calls.lines().all(|call| call.ends_with("--threads 3")));
}

#[test]
fn test_prodigal_gff_from_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let prodigal = fake_prodigal(dir.path());
    let fasta = dir.path().join("chr.fna");
    std::fs::write(&fasta, GENOME).unwrap();

    let gff = Prodigal::new(prodigal.to_str().unwrap())
        .predict(&fasta, None)
        .unwrap();
    let genes = parse_gff(&gff).unwrap();
    assert_eq!(genes.len(), 2);

    let stats = GenomeStats::new(
        SmolStr::new("chr"),
        b"ATGAAATAGCCCTTACATTTTCATGGGAAA",
        &genes,
    )
    .unwrap();
    assert_eq!(stats.row().len(), 148);
}

#[test]
fn test_failing_prodigal_reports_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let prodigal = script(dir.path(), "prodigal", "echo 'bad input' >&2\nexit 1\n");
    let fasta = dir.path().join("chr.fna");
    std::fs::write(&fasta, GENOME).unwrap();

    let err = Prodigal::new(prodigal.to_str().unwrap())
        .predict(&fasta, None)
        .unwrap_err();
    assert!(err.to_string().contains("bad input"));
}

#[test]
fn test_genome_keeps_gff_in_outdir() {
    let dir = tempfile::tempdir().unwrap();
    let prodigal = fake_prodigal(dir.path());
    let fasta = dir.path().join("chr.fna");
    std::fs::write(&fasta, GENOME).unwrap();
    let outdir = dir.path().join("gff");

    run_genome(GenomeArgs {
        files: vec![fasta],
        prodigal: prodigal.to_str().unwrap().to_string(),
        outdir: Some(outdir.clone()),
        header: true,
    })
    .unwrap();

    let gff = std::fs::read_to_string(outdir.join("chr.gff")).unwrap();
    assert_eq!(parse_gff(&gff).unwrap().len(), 2);
}
