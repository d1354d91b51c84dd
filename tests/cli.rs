use assert_cmd::Command;
use std::fs;

const SCENARIO: &str = "chr1\t0\t5\t3\nchr1\t5\t8\t0\nchr1\t8\t10\t3\n";
const HEADER: &str =
    "MeanDepth,MeanDepthCovered,MeanGapSize,MedianDepth,MedianDepthCovered,MedianGapSize";

fn genomedepth() -> Command {
    Command::cargo_bin("genomedepth").unwrap()
}

fn stdout_of(cmd: &mut Command) -> String {
    let out = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_summary_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cov.bedgraph");
    let output = dir.path().join("summary.csv");
    fs::write(&input, SCENARIO).unwrap();

    genomedepth()
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["-b", "3,4"])
        .assert()
        .success();

    let contents = fs::read_to_string(&output).unwrap();
    assert_eq!(
        contents,
        format!(
            "GenomeSize,TotalBases,Breadth1x,Breadth3x,Breadth4x,{}\n\
             10,21,70.000000,70.000000,0.000000,2.100000,3.000000,3.000000,3.000000,3.000000,3.000000\n",
            HEADER
        )
    );
    assert!(!dir.path().join("summary.csv.tmp").exists());
}

#[test]
fn test_stdin_to_stdout() {
    let out = stdout_of(genomedepth().write_stdin(SCENARIO));
    assert_eq!(
        out,
        format!(
            "GenomeSize,TotalBases,Breadth1x,{}\n10,21,70.000000,2.100000,3.000000,3.000000,3.000000,3.000000,3.000000\n",
            HEADER
        )
    );
}

#[test]
fn test_threads_do_not_change_output() {
    let single = genomedepth().write_stdin(SCENARIO).output().unwrap();
    let multi = genomedepth()
        .args(["-t", "4"])
        .write_stdin(SCENARIO)
        .output()
        .unwrap();
    assert!(single.status.success());
    assert!(multi.status.success());
    assert_eq!(single.stdout, multi.stdout);
}

#[test]
fn test_median_modes() {
    let input = "chr1\t0\t1\t1\nchr1\t1\t2\t2\nchr1\t2\t3\t3\nchr1\t3\t4\t4\n";
    let conventional = stdout_of(genomedepth().write_stdin(input));
    assert!(
        conventional.ends_with("\n4,10,100.000000,2.500000,2.500000,NA,2.500000,2.500000,NA\n"),
        "{}",
        conventional
    );
    let legacy = stdout_of(genomedepth().args(["--median", "legacy"]).write_stdin(input));
    assert!(
        legacy.ends_with("\n4,10,100.000000,2.500000,2.500000,NA,3.500000,3.500000,NA\n"),
        "{}",
        legacy
    );
}

#[test]
fn test_histogram_files() {
    let dir = tempfile::tempdir().unwrap();
    let depth = dir.path().join("depth.csv");
    let gaps = dir.path().join("gaps.csv");

    genomedepth()
        .args(["-r", "3"])
        .arg("-d")
        .arg(&depth)
        .arg("-g")
        .arg(&gaps)
        .write_stdin(SCENARIO)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&depth).unwrap(),
        "[0.000000,1.000000),3\n[1.000000,2.000000),0\n[2.000000,3.000000],7\n"
    );
    assert_eq!(
        fs::read_to_string(&gaps).unwrap(),
        "[3.000000,3.000000),0\n[3.000000,3.000000),0\n[3.000000,3.000000],1\n"
    );
}

#[test]
fn test_empty_input_reports_na() {
    let out = stdout_of(genomedepth().args(["-b", "5"]).write_stdin(""));
    assert!(out.starts_with("GenomeSize,TotalBases,Breadth1x,Breadth5x,"));
    assert!(out.ends_with("\n0,0,NA,NA,NA,NA,NA,NA,NA,NA\n"), "{}", out);
}

#[test]
fn test_malformed_line_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("summary.csv");
    let depth = dir.path().join("depth.csv");

    let assert = genomedepth()
        .arg("-o")
        .arg(&output)
        .arg("-d")
        .arg(&depth)
        .write_stdin("chr1\t0\t5\t3\nchr1\t5\tx\t0\n")
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("line 2"), "{}", stderr);

    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_depth_overflow_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("summary.csv");

    let assert = genomedepth()
        .arg("-o")
        .arg(&output)
        .write_stdin("chr1\t0\t5\t3\nchr1\t5\t8\t4294967296\n")
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("4294967296"), "{}", stderr);
    assert!(stderr.contains("line 2"), "{}", stderr);

    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_shared_histogram_path_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let hist = dir.path().join("hist.csv");

    let assert = genomedepth()
        .arg("-d")
        .arg(&hist)
        .arg("-g")
        .arg(&hist)
        .write_stdin(SCENARIO)
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(
        stderr.contains("--depth-histogram and --gap-histogram"),
        "{}",
        stderr
    );

    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_zero_ranges_rejected() {
    let assert = genomedepth()
        .args(["-r", "0"])
        .write_stdin(SCENARIO)
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("--ranges"), "{}", stderr);
}

#[test]
fn test_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    genomedepth()
        .arg("-i")
        .arg(dir.path().join("absent.bedgraph"))
        .assert()
        .failure();
}
