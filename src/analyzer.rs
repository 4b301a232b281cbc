//! The analysis pipeline.
//!
//! An [`Analyzer`] owns a parser and a global environment. Sources are added
//! one by one (parsed, weeded, environment-built); [`Analyzer::check`] then
//! runs the remaining phases in their strict order: type linking, hierarchy
//! checking, name disambiguation, type checking. The first error aborts.
//!
//! The standard library is ordinary input. Building it once and forking the
//! analyzer per compilation keeps the prebuilt environment reusable.

use crate::disambig::disambiguate;
use crate::env::GlobalEnv;
use crate::env::builder::build_unit;
use crate::error::{AnalyzeError, AnalyzeResult};
use crate::hierarchy::hierarchy_check;
use crate::link::type_link;
use crate::syntax::JavaParser;
use crate::typeck::type_check;
use crate::weeder::Weeder;
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use walkdir::WalkDir;

pub struct Analyzer {
    parser: JavaParser,
    env: GlobalEnv,
}

impl Analyzer {
    pub fn new() -> AnalyzeResult<Self> {
        Ok(Self {
            parser: JavaParser::new().map_err(AnalyzeError::ParserInit)?,
            env: GlobalEnv::new(),
        })
    }

    /// An analyzer preloaded with every `.java` file under `stdlib_dir`.
    pub fn with_stdlib(stdlib_dir: &Path) -> AnalyzeResult<Self> {
        let mut analyzer = Self::new()?;
        let mut files: Vec<PathBuf> = WalkDir::new(stdlib_dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "java"))
            .map(|e| e.into_path())
            .collect();
        files.sort();
        for file in files {
            analyzer.add_file(&file)?;
        }
        Ok(analyzer)
    }

    /// A fresh analyzer sharing this one's environment. Used to reuse a
    /// prebuilt standard-library environment across compilations.
    pub fn fork(&self) -> AnalyzeResult<Self> {
        Ok(Self {
            parser: JavaParser::new().map_err(AnalyzeError::ParserInit)?,
            env: self.env.clone(),
        })
    }

    pub fn env(&self) -> &GlobalEnv {
        &self.env
    }

    pub fn add_file(&mut self, path: &Path) -> AnalyzeResult<()> {
        let source = std::fs::read_to_string(path).map_err(|e| AnalyzeError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.add_source(path.to_path_buf(), &source)
    }

    /// Parse, weed, and environment-build one compilation unit.
    pub fn add_source(&mut self, path: PathBuf, source: &str) -> AnalyzeResult<()> {
        debug!(path = %path.display(), "adding compilation unit");

        let tree = self.parser.parse(source).map_err(|e| AnalyzeError::Syntax {
            path: path.clone(),
            line: e.0,
        })?;

        let file_stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Weeder::new(&tree, source, &file_stem).check()?;

        build_unit(&mut self.env, path, source.to_string(), tree)?;
        Ok(())
    }

    /// Run phases 3-6 over everything added so far.
    pub fn check(&mut self) -> AnalyzeResult<()> {
        type_link(&mut self.env).inspect_err(|_| error!("type linking failed"))?;
        hierarchy_check(&mut self.env).inspect_err(|_| error!("hierarchy check failed"))?;
        disambiguate(&mut self.env).inspect_err(|_| error!("name disambiguation failed"))?;
        type_check(&self.env).inspect_err(|_| error!("type check failed"))?;
        Ok(())
    }
}

/// Parse the file and return a printable tree dump, for the `parse` command.
pub fn dump_parse_tree(path: &Path) -> AnalyzeResult<String> {
    let source = std::fs::read_to_string(path).map_err(|e| AnalyzeError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut parser = JavaParser::new().map_err(AnalyzeError::ParserInit)?;
    let tree = parser.parse(&source).map_err(|e| AnalyzeError::Syntax {
        path: path.to_path_buf(),
        line: e.0,
    })?;
    Ok(tree.dump(tree.root(), &source))
}
