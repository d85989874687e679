mod common;

use common::{changes, covered_file, file_xml, markdown, review, rows, wrap_report, Metrics};
use covreview::config::{Config, Thresholds};
use covreview::review::Outcome;
use regex::Regex;

const ONE_ROW: &str = "|src/one.js|100|100|100|100||:white_check_mark:|";

#[test]
fn only_changed_files_are_reported() {
    let xml = wrap_report(&[
        covered_file("src/one.js"),
        covered_file("src/two.js"),
        covered_file("src/three.js"),
    ]);
    let md = markdown(&xml, &changes(&["src/one.js"], &["src/two.js"]), &Config::default());

    assert_eq!(
        rows(&md),
        [
            ONE_ROW,
            "|src/two.js|100|100|100|100||:white_check_mark:|"
        ]
    );
    assert!(md.starts_with("> :+1: Test coverage is looking good.\n"));
}

#[test]
fn no_overlap_renders_nothing() {
    let xml = wrap_report(&[covered_file("src/one.js")]);
    let (outcome, sink) = review(&xml, &changes(&["README.md"], &[]), &Config::default());

    assert_eq!(outcome, Outcome::NoMatchingFiles);
    assert!(sink.reports.is_empty());
    assert!(sink.warnings.is_empty());
}

#[test]
fn rows_beyond_default_cap_collapse() {
    let files: Vec<String> = (0..10).map(|i| covered_file(&format!("src/{i}.js"))).collect();
    let paths: Vec<String> = (0..10).map(|i| format!("src/{i}.js")).collect();
    let paths: Vec<&str> = paths.iter().map(String::as_str).collect();

    let md = markdown(&wrap_report(&files), &changes(&paths, &[]), &Config::default());

    assert_eq!(rows(&md).len(), 3);
    assert!(md.contains("<details>"));
    assert!(md.lines().any(|l| l == "and 7 more..."));
}

#[test]
fn failure_beyond_cap_still_fails_review() {
    let mut files: Vec<String> = (0..9).map(|i| covered_file(&format!("src/{i}.js"))).collect();
    files.push(file_xml("src/9.js", &common::DEFAULT_METRICS, &[(1, 0), (2, 1)]));
    let paths: Vec<String> = (0..10).map(|i| format!("src/{i}.js")).collect();
    let paths: Vec<&str> = paths.iter().map(String::as_str).collect();

    let md = markdown(&wrap_report(&files), &changes(&paths, &[]), &Config::default());

    assert!(md.starts_with("> Test coverage is looking a little low"), "{md}");
    assert!(md.contains("```\nCoverage threshold for lines (80%) not met: 50%\n```"));
    assert_eq!(rows(&md).len(), 3);
    assert!(!md.contains("src/9.js"));
    assert!(md.lines().any(|l| l == "and 7 more..."));
}

#[test]
fn rows_beyond_custom_cap_collapse() {
    let files: Vec<String> = (0..10).map(|i| covered_file(&format!("src/{i}.js"))).collect();
    let paths: Vec<String> = (0..10).map(|i| format!("src/{i}.js")).collect();
    let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
    let config = Config {
        max_rows: 2,
        ..Config::default()
    };

    let md = markdown(&wrap_report(&files), &changes(&[], &paths), &config);

    assert_eq!(rows(&md).len(), 2);
    assert!(md.lines().any(|l| l == "and 8 more..."));
}

#[test]
fn long_path_is_shortened_with_default_budget() {
    let seg = "a".repeat(10);
    let path = vec![seg.as_str(); 10].join("/");
    let xml = wrap_report(&[covered_file(&path)]);

    let md = markdown(&xml, &changes(&[&path], &[]), &Config::default());

    let expected = format!("|../{seg}/{seg}/<br>{seg}/{seg}/<br>{seg}/{seg}/<br>{seg}/{seg}|");
    assert!(rows(&md)[0].starts_with(&expected), "{md}");
}

#[test]
fn long_path_is_shortened_with_custom_budget() {
    let path = "ab/cd/ef/gh/ij/kl/mn";
    let xml = wrap_report(&[covered_file(path)]);
    let config = Config {
        max_chars: 10,
        ..Config::default()
    };

    let md = markdown(&xml, &changes(&[path], &[]), &config);

    assert!(rows(&md)[0].starts_with("|../kl/mn|"), "{md}");
}

#[test]
fn relative_root_strips_working_directory() {
    let cwd = std::env::current_dir().unwrap();
    let xml = wrap_report(&[covered_file(&format!("{}/src/one.js", cwd.display()))]);
    let config = Config {
        root: ".".into(),
        ..Config::default()
    };

    let md = markdown(&xml, &changes(&["src/one.js"], &[]), &config);

    assert_eq!(rows(&md), [ONE_ROW]);
}

#[test]
fn uncovered_lines_are_truncated_after_ten() {
    let lines: Vec<(u32, u64)> = (1..=11).map(|n| (n, 0)).collect();
    let xml = wrap_report(&[file_xml("src/one.js", &common::DEFAULT_METRICS, &lines)]);

    let md = markdown(&xml, &changes(&["src/one.js"], &[]), &Config::default());

    assert_eq!(
        rows(&md),
        ["|src/one.js|100|100|100|0|1, 2, 3, 4, 5, 6, 7, 8, 9, 10...|:x:|"]
    );
}

#[test]
fn single_uncovered_line() {
    let xml = wrap_report(&[file_xml(
        "src/one.js",
        &common::DEFAULT_METRICS,
        &[(1, 0), (2, 1), (3, 1), (4, 1), (5, 1)],
    )]);

    let md = markdown(&xml, &changes(&["src/one.js"], &[]), &Config::default());

    assert_eq!(rows(&md), ["|src/one.js|100|100|100|80|1|:white_check_mark:|"]);
}

#[test]
fn paths_and_lines_link_to_the_last_commit() {
    let xml = wrap_report(&[file_xml(
        "src/one.js",
        &common::DEFAULT_METRICS,
        &[(1, 0), (2, 1), (3, 1), (4, 1), (5, 1)],
    )]);
    let mut changes = changes(&["src/one.js"], &[]);
    changes.commits = vec!["000aaa".to_string(), "abc123".to_string()];

    let md = markdown(&xml, &changes, &Config::default());

    assert_eq!(
        rows(&md),
        ["|[src/one.js](../blob/abc123/src/one.js)|100|100|100|80|\
          [1](../blob/abc123/src/one.js#L1)|:white_check_mark:|"]
    );
}

#[test]
fn missing_report_warns_once() {
    let mut sink = covreview::review::CollectingSink::default();
    let source: Option<Vec<u8>> = None;
    let outcome = covreview::review::run(
        &Config::default(),
        &source,
        &changes(&["src/one.js"], &[]),
        &mut sink,
    )
    .unwrap();

    assert_eq!(outcome, Outcome::MissingReport);
    assert_eq!(sink.warnings.len(), 1);
    let re = Regex::new(r"^No coverage report.*").unwrap();
    assert!(re.is_match(&sink.warnings[0]));
    assert!(sink.reports.is_empty());
}

#[test]
fn missing_report_silent_when_disabled() {
    let mut sink = covreview::review::CollectingSink::default();
    let source: Option<Vec<u8>> = None;
    let config = Config {
        warn_on_no_report: false,
        ..Config::default()
    };
    covreview::review::run(&config, &source, &changes(&["src/one.js"], &[]), &mut sink).unwrap();

    assert!(sink.warnings.is_empty());
    assert!(sink.reports.is_empty());
}

#[test]
fn custom_thresholds_and_failure_message() {
    let metrics = Metrics {
        statements: (10, 9),
        conditionals: (10, 9),
        methods: (10, 9),
    };
    let xml = wrap_report(&[file_xml("src/one.js", &metrics, &[(1, 0), (2, 1)])]);
    let config = Config {
        failure_message: "Coverage is too low.".to_string(),
        threshold: Thresholds {
            statements: 100.0,
            branches: 100.0,
            functions: 100.0,
            lines: 50.0,
        },
        ..Config::default()
    };

    let md = markdown(&xml, &changes(&["src/one.js"], &[]), &config);

    assert!(md.starts_with("> Coverage is too low.\n"));
    assert!(md.contains(
        "```\n\
         Coverage threshold for statements (100%) not met: 90%\n\
         Coverage threshold for branches (100%) not met: 90%\n\
         Coverage threshold for functions (100%) not met: 90%\n\
         ```"
    ));
    assert!(!md.contains("for lines"));
    assert_eq!(rows(&md), ["|src/one.js|90|90|90|50|1|:x:|"]);
}

#[test]
fn every_failed_metric_is_diagnosed() {
    let metrics = Metrics {
        statements: (10, 5),
        conditionals: (4, 1),
        methods: (2, 2),
    };
    let xml = wrap_report(&[
        file_xml("src/one.js", &metrics, &[(1, 0), (2, 1)]),
        covered_file("src/two.js"),
    ]);

    let md = markdown(&xml, &changes(&["src/one.js", "src/two.js"], &[]), &Config::default());

    let diagnostics: Vec<&str> = md
        .lines()
        .filter(|l| l.starts_with("Coverage threshold"))
        .collect();
    assert_eq!(
        diagnostics,
        [
            "Coverage threshold for statements (80%) not met: 50%",
            "Coverage threshold for branches (80%) not met: 25%",
            "Coverage threshold for lines (80%) not met: 50%",
        ]
    );
    // One failing file fails the whole review.
    assert!(md.starts_with("> Test coverage is looking a little low"));
    assert_eq!(rows(&md)[1], "|src/two.js|100|100|100|100||:white_check_mark:|");
}

#[test]
fn custom_success_message() {
    let xml = wrap_report(&[covered_file("src/one.js")]);
    let config = Config {
        success_message: "All good!".to_string(),
        ..Config::default()
    };

    let md = markdown(&xml, &changes(&["src/one.js"], &[]), &config);

    assert!(md.starts_with("> All good!\n"));
    assert!(!md.contains("```"));
}

#[test]
fn show_all_files_ignores_change_set() {
    let xml = wrap_report(&[covered_file("src/one.js"), covered_file("src/two.js")]);
    let config = Config {
        show_all_files: true,
        ..Config::default()
    };

    let md = markdown(&xml, &changes(&[], &[]), &config);

    assert_eq!(rows(&md).len(), 2);
}

#[test]
fn absolute_paths_are_made_relative_to_root() {
    let xml = wrap_report(&[covered_file("/home/user/project/src/one.js")]);
    let config = Config {
        root: "/home/user/project".into(),
        ..Config::default()
    };

    let md = markdown(&xml, &changes(&["src/one.js"], &[]), &config);

    assert_eq!(rows(&md), [ONE_ROW]);
}

#[test]
fn percentages_are_rounded_to_two_decimals() {
    let metrics = Metrics {
        statements: (21, 20),
        conditionals: (3, 1),
        methods: (3, 2),
    };
    let xml = wrap_report(&[file_xml("src/one.js", &metrics, &[(1, 1), (2, 1), (3, 0)])]);

    let md = markdown(&xml, &changes(&["src/one.js"], &[]), &Config::default());

    assert_eq!(rows(&md), ["|src/one.js|95.24|33.33|66.67|66.67|3|:x:|"]);
}

#[test]
fn zero_totals_count_as_fully_covered() {
    let none = Metrics {
        statements: (0, 0),
        conditionals: (0, 0),
        methods: (0, 0),
    };
    let xml = wrap_report(&[file_xml("src/one.js", &none, &[(1, 1)])]);

    let md = markdown(&xml, &changes(&["src/one.js"], &[]), &Config::default());

    assert_eq!(rows(&md), [ONE_ROW]);
}

#[test]
fn file_without_lines_has_no_data() {
    let xml = wrap_report(&[
        file_xml("src/one.js", &common::DEFAULT_METRICS, &[]),
        covered_file("src/two.js"),
    ]);

    let md = markdown(&xml, &changes(&["src/one.js", "src/two.js"], &[]), &Config::default());

    assert_eq!(rows(&md)[0], "|src/one.js|-|-|-|-||-|");
    // A file without data does not fail the review.
    assert!(md.starts_with("> :+1:"));
}

#[test]
fn files_in_every_group_are_found() {
    let xml = format!(
        "<coverage clover=\"3.2.0\">\
         <project name=\"a\">{}<package name=\"lib\">{}</package></project>\
         <project name=\"b\"><package name=\"util\">{}</package></project>\
         </coverage>",
        covered_file("src/one.js"),
        covered_file("src/lib/two.js"),
        covered_file("src/util/three.js"),
    );
    let config = Config {
        max_rows: 10,
        ..Config::default()
    };

    let md = markdown(
        &xml,
        &changes(&["src/one.js", "src/util/three.js"], &["src/lib/two.js"]),
        &config,
    );

    let paths: Vec<&str> = rows(&md)
        .iter()
        .map(|r| r.split('|').nth(1).unwrap())
        .collect();
    assert_eq!(paths, ["src/one.js", "src/lib/two.js", "src/util/three.js"]);
}

#[test]
fn malformed_report_is_an_error() {
    let mut sink = covreview::review::CollectingSink::default();
    let source = Some(include_bytes!("fixtures/malformed_clover.xml").to_vec());
    let result = covreview::review::run(
        &Config::default(),
        &source,
        &changes(&["src/main.js"], &[]),
        &mut sink,
    );

    assert!(result.is_err());
    assert!(sink.reports.is_empty());
}
