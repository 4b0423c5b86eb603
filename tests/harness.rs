use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use budlang::diagnostics;
use budlang::interp::{Interp, InterpConfig};
use budlang::parser;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum CaseClass {
    RuntimeSuccess,
    ParseError,
    RuntimeError,
}

#[derive(Debug, Deserialize, Clone)]
struct CaseSpec {
    class: CaseClass,
    stdout_file: Option<String>,
    error_contains: Option<String>,
}

#[derive(Debug, Clone)]
struct Case {
    name: String,
    dir: PathBuf,
    program_path: PathBuf,
    spec: CaseSpec,
}

impl Case {
    fn read_text(&self, relative_path: &str) -> Result<String> {
        fs::read_to_string(self.dir.join(relative_path))
            .with_context(|| format!("Reading {} fixture file {}", self.name, relative_path))
    }
}

fn load_cases(programs_dir: &Path) -> Result<Vec<Case>> {
    let mut cases = Vec::new();

    for entry in
        fs::read_dir(programs_dir).with_context(|| format!("Reading {}", programs_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }

        let case_path = path.join("case.yaml");
        if !case_path.exists() {
            continue;
        }

        let program_path = path.join("program.bud");
        ensure!(
            program_path.exists(),
            "Missing program.bud for case {}",
            path.display()
        );

        let case_name = path
            .file_name()
            .and_then(|value| value.to_str())
            .map(str::to_string)
            .with_context(|| format!("Invalid case directory name {}", path.display()))?;
        let case_raw = fs::read_to_string(&case_path)
            .with_context(|| format!("Reading {}", case_path.display()))?;
        let spec: CaseSpec = serde_yaml::from_str(&case_raw)
            .with_context(|| format!("Parsing {}", case_path.display()))?;

        cases.push(Case {
            name: case_name,
            dir: path,
            program_path,
            spec,
        });
    }

    ensure!(
        !cases.is_empty(),
        "No test cases found in {}",
        programs_dir.display()
    );
    cases.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(cases)
}

fn normalize_output(output: &str) -> String {
    output.replace("\r\n", "\n").trim_end().to_string()
}

fn interp_for(case: &Case) -> Interp {
    // Module files sit next to the program, so imports resolve inside the
    // case directory.
    Interp::new(InterpConfig {
        module_root: case.dir.clone(),
        source_name: "program.bud".to_string(),
        ..InterpConfig::default()
    })
}

fn run_case(case: &Case) -> Result<()> {
    let source = fs::read_to_string(&case.program_path)
        .with_context(|| format!("Reading {}", case.name))?;
    let parsed = parser::parse(&source);

    match case.spec.class {
        CaseClass::RuntimeSuccess => {
            let script = parsed.with_context(|| format!("Parsing {}", case.name))?;
            let mut interp = interp_for(case);
            interp
                .run(&script)
                .with_context(|| format!("Running {}", case.name))?;
            let stdout_file = case
                .spec
                .stdout_file
                .as_deref()
                .with_context(|| format!("Missing stdout_file in {}", case.name))?;
            let expected = normalize_output(&case.read_text(stdout_file)?);
            let actual = normalize_output(&interp.output().join("\n"));
            ensure!(
                actual == expected,
                "Output mismatch for {}: expected\n{expected}\ngot\n{actual}",
                case.name
            );
        }
        CaseClass::ParseError => {
            let expected = case
                .spec
                .error_contains
                .as_deref()
                .with_context(|| format!("Missing error_contains in {}", case.name))?;
            let error = match parsed {
                Err(error) => error,
                Ok(_) => anyhow::bail!("Expected a parse error in {}", case.name),
            };
            let rendered =
                diagnostics::render("program.bud", error.line(), error.token(), &error.to_string());
            ensure!(
                rendered.contains(expected),
                "Expected diagnostic containing '{expected}' in {}, got\n{rendered}",
                case.name
            );
        }
        CaseClass::RuntimeError => {
            let expected = case
                .spec
                .error_contains
                .as_deref()
                .with_context(|| format!("Missing error_contains in {}", case.name))?;
            let script = parsed.with_context(|| format!("Parsing {}", case.name))?;
            let mut interp = interp_for(case);
            let error = match interp.run(&script) {
                Err(error) => error,
                Ok(_) => anyhow::bail!("Expected a runtime error in {}", case.name),
            };
            let actual = error.to_string();
            ensure!(
                actual.contains(expected),
                "Expected error containing '{expected}' in {}, got '{actual}'",
                case.name
            );
        }
    }
    Ok(())
}

#[test]
fn runs_program_fixtures() -> Result<()> {
    for case in load_cases(Path::new("tests/programs"))? {
        run_case(&case).with_context(|| format!("Case {}", case.name))?;
    }
    Ok(())
}
