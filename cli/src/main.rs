// Copyright 2024 The fnhist Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command-line driver: analyzes a repository and prints the resulting
//! model as JSON for downstream presentation layers.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use fnhist_lib::coloring::Coloring;
use fnhist_lib::coloring::Mode;
use fnhist_lib::collector::AnalysisOptions;
use fnhist_lib::collector::create_history;
use fnhist_lib::diff;
use fnhist_lib::git_backend::GitBackend;
use fnhist_lib::history::FunctionHistory;
use fnhist_lib::history::History;
use fnhist_lib::lcs;
use fnhist_lib::object_id::CommitId;
use fnhist_lib::stats;
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "fnhist", version, about = "Function-level history analysis for Go repositories")]
struct Args {
    /// Path to the repository working copy.
    #[arg(long, default_value = ".")]
    path: PathBuf,

    /// Start reference: a commit hash or a branch short name.
    #[arg(long, default_value = "master")]
    start: String,

    /// End commit hash bounding the analyzed interval; defaults to the
    /// first-parent root.
    #[arg(long)]
    end: Option<String>,

    /// Analyze _test.go files too.
    #[arg(long)]
    include_tests: bool,

    /// Produce line-based text diffs instead of structural ones.
    #[arg(long)]
    text_diff: bool,

    /// Also emit per-revision colorings for this function id.
    #[arg(long)]
    function: Option<String>,
}

#[derive(Serialize)]
struct Output {
    report: stats::Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    function: Option<FunctionOutput>,
}

#[derive(Serialize)]
struct FunctionOutput {
    id: String,
    revisions: Vec<RevisionOutput>,
}

#[derive(Serialize)]
struct RevisionOutput {
    commit: CommitId,
    new: bool,
    offset: usize,
    text: String,
    /// Coloring of this revision against its predecessor, over this
    /// revision's buffer.
    right: Coloring,
    /// Coloring of the predecessor against this revision, over the
    /// predecessor's buffer.
    left: Coloring,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            let mut source = std::error::Error::source(err.as_ref());
            while let Some(err) = source {
                eprintln!("Caused by: {err}");
                source = err.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(path = %args.path.display(), start = args.start, "analyzing repository");
    let backend = Arc::new(GitBackend::load(&args.path)?);
    let options = AnalysisOptions {
        include_tests: args.include_tests,
    };
    let history = create_history(backend, &args.start, args.end.as_deref(), &options)?;
    let output = Output {
        report: stats::report(&history),
        function: args
            .function
            .as_ref()
            .map(|id| function_output(&history, id, args.text_diff))
            .transpose()?,
    };
    serde_json::to_writer_pretty(std::io::stdout().lock(), &output)?;
    println!();
    Ok(())
}

fn function_output(
    history: &History,
    id: &str,
    text_diff: bool,
) -> Result<FunctionOutput, Box<dyn std::error::Error>> {
    let entry = history
        .entries()
        .into_iter()
        .find(|(entry_id, _)| entry_id == id)
        .ok_or_else(|| format!("function {id} not found"))?;
    let function_history = entry.1.lock().unwrap();
    Ok(FunctionOutput {
        id: id.to_string(),
        revisions: revision_outputs(&function_history, text_diff),
    })
}

fn revision_outputs(history: &FunctionHistory, text_diff: bool) -> Vec<RevisionOutput> {
    let mut elements: Vec<_> = history.elements.iter().collect();
    elements.sort_by_key(|(id, element)| (element.commit.timestamp(), (*id).clone()));

    let mut revisions = Vec::with_capacity(elements.len());
    for (index, (id, element)) in elements.iter().enumerate() {
        let previous = index.checked_sub(1).map(|i| elements[i].1);
        let (left, right) = if text_diff {
            let previous_text = previous.map(|p| (p.text.as_str(), p.offset));
            let left = previous_text
                .map(|(text, offset)| lcs::lcs_diff(text, &element.text, offset, Mode::Old))
                .unwrap_or_default();
            let right = previous_text
                .map(|(text, _)| lcs::lcs_diff(text, &element.text, element.offset, Mode::New))
                .unwrap_or_default();
            (left, right)
        } else {
            let previous_func = previous.and_then(|p| p.func.as_deref());
            let left = diff::diff(previous_func, element.func.as_deref(), Mode::Old);
            let right = diff::diff(element.func.as_deref(), previous_func, Mode::New);
            (left, right)
        };
        revisions.push(RevisionOutput {
            commit: (*id).clone(),
            new: element.new,
            offset: element.offset,
            text: element.text.clone(),
            left,
            right,
        });
    }
    revisions
}
