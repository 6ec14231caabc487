// Opusmux Check Tool
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod verify;

use std::path::Path;
use std::process;

use clap::{value_parser, Arg, ArgAction};
use log::{info, warn};
use serde::Serialize;

use opusmux::{extract, mkv, remux_with_options, LacingPolicy, RemuxOptions};

use crate::verify::{verify, Verification};

#[derive(Serialize)]
struct Report<'a> {
    input: &'a str,
    input_bytes: usize,
    output_bytes: usize,
    #[serde(flatten)]
    verification: Verification,
    passed: bool,
}

fn print_report(report: &Report<'_>) {
    let res = &report.verification;

    println!("Input Path: {}", report.input);
    println!();
    println!("Remux Results");
    println!("=================================================");
    println!();
    println!("  Input/Output Bytes:   {:>12}/{:>12}", report.input_bytes, report.output_bytes);
    println!("  Pages:                {:>12}", res.pages);
    println!("  Packets:              {:>12}", res.packets);
    println!("  Serial:               {:>#12x}", res.serial);
    println!("  Channels:             {:>12}", res.channel_count);
    println!("  Pre-skip:             {:>12}", res.pre_skip);
    println!("  Final Granule:        {:>12}", res.final_granule);
    println!("  Duration:             {:>11.3}s", res.duration);
    println!();

    for failure in &res.failures {
        println!("  FAIL: {}", failure);
    }

    if !res.failures.is_empty() {
        println!();
    }

    println!("PASS?: {}", if report.passed { "PASS" } else { "FAIL" });
}

/// Writes the remuxed stream, failing if the whole stream could not be written.
fn write_output(path: &Path, output: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, output)
}

fn main() {
    pretty_env_logger::init();

    let matches = clap::Command::new("Opusmux Check")
        .version("1.0")
        .about("Remux a WebM/Opus file to Ogg/Opus and verify the result")
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("PATH")
                .help("Write the Ogg/Opus stream to this path"),
        )
        .arg(
            Arg::new("page-size")
                .long("page-size")
                .value_parser(value_parser!(usize))
                .help("Target payload size of data pages, in bytes"),
        )
        .arg(
            Arg::new("serial")
                .long("serial")
                .value_parser(value_parser!(u32))
                .help("Ogg stream serial number (default: checksum of the input)"),
        )
        .arg(
            Arg::new("decode-lacing")
                .long("decode-lacing")
                .action(ArgAction::SetTrue)
                .help("Decode laced blocks instead of rejecting them"),
        )
        .arg(Arg::new("vendor").long("vendor").help("Vendor string of the comment header"))
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the report as JSON"),
        )
        .arg(Arg::new("INPUT").help("The input file path").required(true).index(1))
        .get_matches();

    let mut options = RemuxOptions::default();

    if let Some(&page_size) = matches.get_one::<usize>("page-size") {
        options.target_page_size = page_size;
    }
    if let Some(&serial) = matches.get_one::<u32>("serial") {
        options.serial = Some(serial);
    }
    if matches.get_flag("decode-lacing") {
        options.lacing = LacingPolicy::Decode;
    }
    if let Some(vendor) = matches.get_one::<String>("vendor") {
        options.vendor = vendor.clone();
    }

    let path = matches.get_one::<String>("INPUT").map(String::as_str).unwrap_or_default();

    let input = match std::fs::read(path) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("Failed to read {}: {}", path, err);
            process::exit(1);
        }
    };

    let output = match remux_with_options(&input, &options) {
        Ok(output) => output,
        Err(err) => {
            eprintln!("Remux failed: {}", err);
            process::exit(1);
        }
    };

    // The packets as the extractor sees them are the reference for the written stream.
    let stream = match mkv::parse(&input, &options).and_then(|doc| extract(&doc, &options)) {
        Ok(stream) => stream,
        Err(err) => {
            eprintln!("Remux failed: {}", err);
            process::exit(1);
        }
    };

    let verification = verify(&output, &stream.packets);

    if let Some(out_path) = matches.get_one::<String>("output") {
        match write_output(Path::new(out_path), &output) {
            Ok(()) => info!("wrote {} bytes to {}", output.len(), out_path),
            Err(err) => {
                eprintln!("Failed to write {}: {}", out_path, err);
                process::exit(1);
            }
        }
    }

    let passed = verification.passed();

    let report = Report {
        input: path,
        input_bytes: input.len(),
        output_bytes: output.len(),
        verification,
        passed,
    };

    if matches.get_flag("json") {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(err) => warn!("failed to serialize report: {}", err),
        }
    }
    else {
        print_report(&report);
    }

    if !passed {
        process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::write_output;

    #[test]
    fn verify_write_output_reports_failure() {
        let dir = std::env::temp_dir().join("opusmux-check-missing-dir");
        let _ = std::fs::remove_dir_all(&dir);

        assert!(write_output(&dir.join("out.opus"), b"OggS").is_err());
    }

    #[test]
    fn verify_write_output_writes_stream() {
        let path = std::env::temp_dir().join("opusmux-check-write-output.opus");

        write_output(&path, b"OggS").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"OggS");

        let _ = std::fs::remove_file(&path);
    }
}
