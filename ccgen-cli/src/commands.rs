//! One function per subcommand, in the shape of `dandy-cli`'s
//! `grammar::parse_grammar(main_args, args, output)`: read inputs, call into
//! `ccgen`, report outcome.

use ccgen::error::{BuildError, CompileError};
use ccgen::CompilerSpec;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("error reading {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("failed to build compiler: {0}")]
    Build(#[from] BuildError),
    #[error("{0}")]
    Compile(#[from] CompileError),
    #[error("failed to serialize compiler artifact: {0}")]
    Encode(#[from] bincode::Error),
    #[error("{0} program(s) failed to compile")]
    SomeTestsFailed(usize),
}

fn read_to_string(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io { path: path.display().to_string(), source })
}

fn generate(lexer_rules: &Path, grammar_rules: &Path) -> Result<CompilerSpec, CliError> {
    let lexer_text = read_to_string(lexer_rules)?;
    let grammar_text = read_to_string(grammar_rules)?;
    log::info!("lexer rules: {}", lexer_rules.display());
    log::info!("grammar rules: {}", grammar_rules.display());
    let spec = CompilerSpec::generate(&lexer_text, &grammar_text)?;
    Ok(spec)
}

pub fn build(lexer_rules: &Path, grammar_rules: &Path, output: &Path) -> Result<(), CliError> {
    let spec = generate(lexer_rules, grammar_rules)?;
    let bytes = spec.to_bytes()?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| CliError::Io { path: parent.display().to_string(), source })?;
    }
    fs::write(output, bytes).map_err(|source| CliError::Io { path: output.display().to_string(), source })?;
    log::info!("compiler artifact written to {}", output.display());
    Ok(())
}

pub fn compile(
    lexer_rules: &Path,
    grammar_rules: &Path,
    source: &Path,
    output: Option<&Path>,
    compiler: Option<&Path>,
) -> Result<(), CliError> {
    let spec = match compiler {
        Some(path) => {
            let bytes = fs::read(path).map_err(|source| CliError::Io { path: path.display().to_string(), source })?;
            CompilerSpec::from_bytes(&bytes)?
        }
        None => generate(lexer_rules, grammar_rules)?,
    };

    let source_text = read_to_string(source)?;
    log::info!("compiling {}", source.display());
    let tac = spec.compile(&source_text)?;

    match output {
        Some(path) => {
            fs::write(path, &tac).map_err(|source| CliError::Io { path: path.display().to_string(), source })?;
            log::info!("three-address code written to {}", path.display());
        }
        None => print!("{tac}"),
    }
    Ok(())
}

pub fn test_compiler(lexer_rules: &Path, grammar_rules: &Path, program_dir: &Path, output_dir: &Path) -> Result<(), CliError> {
    let spec = generate(lexer_rules, grammar_rules)?;

    if !program_dir.is_dir() {
        return Err(CliError::Io {
            path: program_dir.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }
    fs::create_dir_all(output_dir).map_err(|source| CliError::Io { path: output_dir.display().to_string(), source })?;

    let mut entries: Vec<_> = fs::read_dir(program_dir)
        .map_err(|source| CliError::Io { path: program_dir.display().to_string(), source })?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "src"))
        .collect();
    entries.sort();

    let mut success = 0usize;
    let mut failed = 0usize;

    for src_path in entries {
        let out_path = output_dir.join(src_path.with_extension("tac").file_name().unwrap());
        log::info!("testing program: {}", src_path.display());

        match read_to_string(&src_path).and_then(|text| spec.compile(&text).map_err(CliError::from)) {
            Ok(tac) => match fs::write(&out_path, tac) {
                Ok(()) => {
                    log::info!("passed: {} -> {}", src_path.display(), out_path.display());
                    success += 1;
                }
                Err(source) => {
                    eprintln!("failed writing {}: {source}", out_path.display());
                    failed += 1;
                }
            },
            Err(e) => {
                eprintln!("failed: {} ({e})", src_path.display());
                failed += 1;
            }
        }
    }

    log::info!("{success} passed, {failed} failed, {} total", success + failed);
    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::SomeTestsFailed(failed))
    }
}
