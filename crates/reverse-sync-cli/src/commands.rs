use anyhow::{Context, Result};
use rayon::prelude::*;
use reverse_sync_config::Config;
use reverse_sync_engine::io;
use reverse_sync_engine::roundtrip::{build_record, splice_rehydrate};
use reverse_sync_engine::verify::{
    CaseReport, FailureReason, summarize, verify_case, verify_rehydration,
};
use reverse_sync_engine::{LostInfo, generate_mapping, sync_document};
use std::path::{Path, PathBuf};

use crate::cli::{BatchVerifyArgs, MappingArgs, PatchArgs, RoundtripCommands, VerifyArgs};

/// Outcome of a command that judges something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    fn from_passed(passed: bool) -> Self {
        if passed { Status::Pass } else { Status::Fail }
    }
}

fn read(path: &Path) -> Result<String> {
    io::read_path(path).with_context(|| format!("reading {}", path.display()))
}

fn write_or_print(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            io::write_path(path, content).with_context(|| format!("writing {}", path.display()))
        }
        None => {
            print!("{content}");
            Ok(())
        }
    }
}

fn write_artifacts(report: &CaseReport, dir: &Path) -> Result<()> {
    io::write_path(&dir.join("actual.xhtml"), &report.patched)?;
    if let Some(diff) = &report.diff {
        io::write_path(&dir.join("diff.patch"), diff)?;
    }
    Ok(())
}

fn print_report(report: &CaseReport) {
    if report.passed {
        println!("PASS {}", report.name);
    } else {
        let reason = report.reason.unwrap_or(FailureReason::Other);
        println!("FAIL {} ({})", report.name, reason.as_str());
    }
}

pub fn verify(args: VerifyArgs, config: &Config) -> Result<Status> {
    if !args.case_dir.is_dir() {
        anyhow::bail!("case directory not found: {}", args.case_dir.display());
    }
    let case = io::load_case(&args.case_dir)
        .with_context(|| format!("loading case {}", args.case_dir.display()))?;
    let report = verify_case(&case);

    print_report(&report);
    if let Some(diff) = &report.diff {
        print!("{diff}");
    }
    for text in &report.missing {
        println!("  missing: {text}");
    }
    if report.roundtrip_ok == Some(false) {
        println!("  round-trip record does not restore page.xhtml");
    }
    if args.write_artifacts || config.write_artifacts {
        write_artifacts(&report, &case.dir)?;
    }
    Ok(Status::from_passed(report.passed))
}

fn run_case(dir: &Path, artifacts: bool) -> CaseReport {
    let report = match io::load_case(dir) {
        Ok(case) => verify_case(&case),
        Err(e) => CaseReport::load_failure(io::case_name(dir), &e),
    };
    if artifacts && let Err(e) = write_artifacts(&report, dir) {
        log::warn!("{}: could not write artifacts: {e:#}", report.name);
    }
    report
}

pub fn batch_verify(args: BatchVerifyArgs, config: &Config) -> Result<Status> {
    let root = args.root.clone().unwrap_or_else(|| config.cases_path.clone());
    if !root.is_dir() {
        anyhow::bail!("case root not found: {}", root.display());
    }

    let mut selection = config.clone();
    if let Some(pattern) = args.pattern {
        selection.case_pattern = pattern;
    }
    let dirs: Vec<PathBuf> = selection.select_cases(io::scan_case_dirs(&root)?)?;
    log::info!("verifying {} cases under {}", dirs.len(), root.display());

    let artifacts = args.write_artifacts || config.write_artifacts;
    let reports: Vec<CaseReport> = if config.parallel && !args.sequential {
        dirs.par_iter().map(|d| run_case(d, artifacts)).collect()
    } else {
        dirs.iter().map(|d| run_case(d, artifacts)).collect()
    };

    for report in &reports {
        print_report(report);
    }
    let summary = summarize(&reports);
    print!("{summary}");
    Ok(Status::from_passed(summary.all_passed()))
}

pub fn roundtrip(command: RoundtripCommands) -> Result<Status> {
    match command {
        RoundtripCommands::Generate {
            mdx,
            xhtml,
            output,
            page_id,
            mapping,
        } => {
            let block_text = read(&mdx)?;
            let target = read(&xhtml)?;
            let lost_info = match mapping {
                Some(path) => io::load_mapping(&path)
                    .with_context(|| format!("loading {}", path.display()))?
                    .lost_info,
                None => LostInfo::default(),
            };
            match build_record(&target, &block_text, &page_id, &lost_info) {
                Ok(record) => {
                    io::save_record(&output, &record)
                        .with_context(|| format!("writing {}", output.display()))?;
                    println!("wrote {} ({} blocks)", output.display(), record.blocks.len());
                    Ok(Status::Pass)
                }
                Err(e) => {
                    println!("FAIL {e}");
                    Ok(Status::Fail)
                }
            }
        }
        RoundtripCommands::Verify {
            mdx,
            record,
            expected,
        } => {
            let block_text = read(&mdx)?;
            let record = io::load_record(&record)
                .with_context(|| format!("loading {}", record.display()))?;
            let expected = match expected {
                Some(path) => read(&path)?,
                None => record.reassemble(),
            };
            match verify_rehydration(&block_text, &record, &expected) {
                Ok(()) => {
                    println!("PASS");
                    Ok(Status::Pass)
                }
                Err(e) => {
                    println!("FAIL {e}");
                    Ok(Status::Fail)
                }
            }
        }
        RoundtripCommands::Splice {
            mdx,
            record,
            output,
        } => {
            let block_text = read(&mdx)?;
            let record = io::load_record(&record)
                .with_context(|| format!("loading {}", record.display()))?;
            let outcome = splice_rehydrate(&block_text, &record);
            eprintln!(
                "matched={} emitted={} preserved={} total={}",
                outcome.matched, outcome.emitted, outcome.preserved, outcome.total_blocks
            );
            write_or_print(output.as_deref(), &outcome.markup)?;
            Ok(Status::Pass)
        }
    }
}

pub fn mapping(args: MappingArgs) -> Result<Status> {
    let block_text = read(&args.mdx)?;
    let target = read(&args.xhtml)?;
    let mapping = generate_mapping(&target, &block_text, &args.page_id);
    write_or_print(args.output.as_deref(), &mapping.to_yaml()?)?;
    Ok(Status::Pass)
}

pub fn patch(args: PatchArgs) -> Result<Status> {
    let original = read(&args.original)?;
    let improved = read(&args.improved)?;
    let page = read(&args.page)?;
    let mapping = args
        .mapping
        .as_deref()
        .map(|path| io::load_mapping(path).with_context(|| format!("loading {}", path.display())))
        .transpose()?;

    let outcome = sync_document(&original, &improved, &page, mapping.as_ref());
    if args.show_plan {
        for label in outcome.strategies() {
            eprintln!("{:<10} {}", label.strategy, label.address);
        }
        for skipped in &outcome.plan.skipped {
            eprintln!("{:<10} block {}: {}", "skipped", skipped.position, skipped.reason);
        }
    }
    write_or_print(args.output.as_deref(), &outcome.markup)?;
    Ok(Status::Pass)
}
