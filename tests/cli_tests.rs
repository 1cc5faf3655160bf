//! End-to-end tests of the `graphbin` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CANU_GFA: &str = "S\tctg1\t*\nS\tctg2\t*\nS\tctg3\t*\nS\tctg4\t*\nS\tctg5\t*\n\
L\tctg1\t+\tctg2\t+\t0M\nL\tctg2\t+\tctg3\t-\t0M\n";

const CONTIGS_FASTA: &str = ">ctg1\nACGTACGT\n>ctg2\nGGCCGGCC\n>ctg3\nTTAATTAA\n>ctg4\nCATGCATG\n>ctg5\nAAAACCCC\n";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(binning: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("assembly.gfa"), CANU_GFA).unwrap();
        fs::write(dir.path().join("contigs.fasta"), CONTIGS_FASTA).unwrap();
        fs::write(dir.path().join("initial.csv"), binning).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn out(&self) -> PathBuf {
        self.path("out")
    }

    /// Canu refine command with the fixture's inputs already set
    fn refine(&self) -> Command {
        let mut cmd = Command::cargo_bin("graphbin").unwrap();
        cmd.arg("refine")
            .arg("--assembler")
            .arg("canu")
            .arg("--graph")
            .arg(self.path("assembly.gfa"))
            .arg("--binned")
            .arg(self.path("initial.csv"))
            .arg("--output")
            .arg(self.out());
        cmd
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_refine_writes_outputs() {
    let fixture = Fixture::new("ctg1,1\nctg4,2\n");

    fixture
        .refine()
        .arg("--contigs")
        .arg(fixture.path("contigs.fasta"))
        .assert()
        .success()
        .stdout(predicate::str::contains("4 of 5 contigs binned"));

    let out = fixture.out();
    assert_eq!(
        read(&out.join("graphbin_output.csv")),
        "ctg1,1\nctg2,1\nctg3,1\nctg4,2\n"
    );
    assert_eq!(read(&out.join("graphbin_unbinned.csv")), "ctg5\n");

    let bin_1 = read(&out.join("bins").join("bin_1.fasta"));
    assert!(bin_1.contains(">ctg1"));
    assert!(bin_1.contains(">ctg3"));
    assert!(!bin_1.contains(">ctg4"));
    let bin_2 = read(&out.join("bins").join("bin_2.fasta"));
    assert!(bin_2.contains(">ctg4\nCATGCATG"));
}

#[test]
fn test_refine_prefix_and_delimiter() {
    let fixture = Fixture::new("ctg1\t1\nctg4\t2\n");

    fixture
        .refine()
        .args(["--delimiter", "tab", "--prefix", "run1_"])
        .assert()
        .success();

    let out = fixture.out();
    assert_eq!(
        read(&out.join("run1_graphbin_output.csv")),
        "ctg1\t1\nctg2\t1\nctg3\t1\nctg4\t2\n"
    );
    // No contigs file, no bins directory
    assert!(!out.join("run1_bins").exists());
}

#[test]
fn test_refine_json_summary() {
    let fixture = Fixture::new("ctg1,1\nctg4,2\n");

    let output = fixture
        .refine()
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["assembler"], "canu");
    assert_eq!(summary["stats"]["node_count"], 5);
    assert_eq!(summary["stats"]["finally_binned"], 4);
    assert_eq!(summary["config"]["max_iteration"], 100);
}

#[test]
fn test_refine_spades_paths_graph() {
    let fixture = Fixture::new("NODE_1_length_500_cov_2.0,A\nNODE_3_length_100_cov_1.0,B\n");
    fs::write(
        fixture.path("graph.gfa"),
        "S\t1\t*\nS\t2\t*\nS\t3\t*\nS\t4\t*\nS\t5\t*\n\
L\t2\t+\t3\t+\t0M\n",
    )
    .unwrap();
    fs::write(
        fixture.path("contigs.paths"),
        "NODE_1_length_500_cov_2.0\n1+,2+\nNODE_1_length_500_cov_2.0'\n2-,1-\n\
NODE_2_length_300_cov_1.5\n3+,4+\nNODE_2_length_300_cov_1.5'\n4-,3-\n\
NODE_3_length_100_cov_1.0\n5+\nNODE_3_length_100_cov_1.0'\n5-\n",
    )
    .unwrap();

    Command::cargo_bin("graphbin")
        .unwrap()
        .arg("refine")
        .args(["--assembler", "spades"])
        .arg("--graph")
        .arg(fixture.path("graph.gfa"))
        .arg("--paths")
        .arg(fixture.path("contigs.paths"))
        .arg("--binned")
        .arg(fixture.path("initial.csv"))
        .arg("--output")
        .arg(fixture.out())
        .assert()
        .success();

    // NODE_2 is linked to NODE_1 through segments 2 and 3; NODE_3 stands alone
    assert_eq!(
        read(&fixture.out().join("graphbin_output.csv")),
        "NODE_1_length_500_cov_2.0,A\nNODE_2_length_300_cov_1.5,A\nNODE_3_length_100_cov_1.0,B\n"
    );
}

#[test]
fn test_refine_rejects_zero_iterations() {
    let fixture = Fixture::new("ctg1,1\n");

    fixture
        .refine()
        .args(["--max-iteration", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
    assert!(!fixture.out().exists());
}

#[test]
fn test_refine_rejects_negative_threshold() {
    let fixture = Fixture::new("ctg1,1\n");

    fixture
        .refine()
        .arg("--diff-threshold=-1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_refine_rejects_conflicting_bins() {
    let fixture = Fixture::new("ctg1,1\nctg1,2\n");

    fixture
        .refine()
        .assert()
        .failure()
        .stderr(predicate::str::contains("ctg1"));
    assert!(!fixture.out().exists());
}

#[test]
fn test_refine_rejects_unknown_contig() {
    let fixture = Fixture::new("ctg1,1\nctg99,2\n");

    fixture
        .refine()
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Contig 'ctg99' was not found in the assembly graph",
        ));
}

#[test]
fn test_refine_requires_paths_for_spades() {
    let fixture = Fixture::new("ctg1,1\n");

    Command::cargo_bin("graphbin")
        .unwrap()
        .arg("refine")
        .args(["--assembler", "spades"])
        .arg("--graph")
        .arg(fixture.path("assembly.gfa"))
        .arg("--binned")
        .arg(fixture.path("initial.csv"))
        .arg("--output")
        .arg(fixture.out())
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires --paths"));
}

#[test]
fn test_refine_rejects_bad_delimiter() {
    let fixture = Fixture::new("ctg1|1\n");

    fixture
        .refine()
        .args(["--delimiter", "|"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported delimiter"));
}

#[test]
fn test_refine_rejects_path_in_prefix() {
    let fixture = Fixture::new("ctg1,1\n");

    fixture
        .refine()
        .args(["--prefix", "../escape_"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid prefix"));
}

#[test]
fn test_refine_missing_graph_file() {
    let fixture = Fixture::new("ctg1,1\n");

    Command::cargo_bin("graphbin")
        .unwrap()
        .arg("refine")
        .args(["--assembler", "canu"])
        .arg("--graph")
        .arg(fixture.path("missing.gfa"))
        .arg("--binned")
        .arg(fixture.path("initial.csv"))
        .arg("--output")
        .arg(fixture.out())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_refine_bad_contigs_writes_nothing() {
    let fixture = Fixture::new("ctg1,1\nctg4,2\n");
    fs::write(fixture.path("bad.fasta"), "this is not fasta\n").unwrap();

    fixture
        .refine()
        .arg("--contigs")
        .arg(fixture.path("bad.fasta"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read contigs"));
    assert!(!fixture.out().exists());
}

#[test]
fn test_refine_rejects_colliding_bin_files() {
    let fixture = Fixture::new("ctg1,a/b\nctg4,a_b\n");

    fixture
        .refine()
        .arg("--contigs")
        .arg(fixture.path("contigs.fasta"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("would both be written to"));
    assert!(!fixture.out().exists());
}
