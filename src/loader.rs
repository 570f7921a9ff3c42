use crate::error::{Error, Result};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use walkdir::WalkDir;

/// A package: one directory directly holding Rust source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// Directory of the package
    pub path: PathBuf,
    /// Package name, the directory name
    pub name: String,
    /// The `.rs` files directly inside the directory
    pub files: Vec<PathBuf>,
}

impl PackageInfo {
    /// Path as the string key handed to the schema parser.
    pub fn path_str(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    /// True when the package holds `<stem>.rs`.
    pub fn has_file_stem(&self, stem: &str) -> bool {
        self.files
            .iter()
            .any(|f| f.file_stem().and_then(|s| s.to_str()) == Some(stem))
    }
}

/// The parsed syntax trees of every file in a package.
#[derive(Debug)]
pub struct PackageAst {
    pub path: PathBuf,
    /// File name to syntax tree
    pub files: BTreeMap<String, syn::File>,
}

/// Package loader for a project tree.
///
/// The loader walks the project directory once to index packages, skipping
/// `target` and hidden directories. Syntax trees are parsed on demand by
/// [`PackageLoader::get_pkg_ast`] and cached for the rest of the run.
///
/// # Example
///
/// ```no_run
/// use openapi_from_annotations::loader::PackageLoader;
/// use std::path::PathBuf;
///
/// let mut loader = PackageLoader::new(PathBuf::from("./my-project"));
/// for package in loader.packages().to_vec() {
///     let ast = loader.get_pkg_ast(&package.path_str()).unwrap();
///     println!("{}: {} files", package.name, ast.files.len());
/// }
/// ```
pub struct PackageLoader {
    root_path: PathBuf,
    packages: Vec<PackageInfo>,
    /// Warning messages for paths that could not be accessed while scanning
    warnings: Vec<String>,
    cache: HashMap<PathBuf, Rc<PackageAst>>,
}

impl PackageLoader {
    /// Creates a loader and indexes the packages under `root_path`.
    pub fn new(root_path: PathBuf) -> Self {
        let mut loader = Self {
            root_path,
            packages: Vec::new(),
            warnings: Vec::new(),
            cache: HashMap::new(),
        };
        loader.scan();
        loader
    }

    pub fn packages(&self) -> &[PackageInfo] {
        &self.packages
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Packages whose directory name is `name`.
    pub fn find_by_name(&self, name: &str) -> Vec<&PackageInfo> {
        self.packages.iter().filter(|p| p.name == name).collect()
    }

    /// Packages holding a file `<stem>.rs`.
    pub fn find_by_file_stem(&self, stem: &str) -> Vec<&PackageInfo> {
        self.packages
            .iter()
            .filter(|p| p.has_file_stem(stem))
            .collect()
    }

    /// Package indexed at `pkg_path`, if any.
    pub fn package(&self, pkg_path: &str) -> Option<&PackageInfo> {
        let path = Path::new(pkg_path);
        self.packages.iter().find(|p| p.path == path)
    }

    fn scan(&mut self) {
        let root = self.root_path.clone();
        let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();

        for entry in WalkDir::new(&root)
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == root {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_target = file_name == "target";

                !is_hidden && !is_target
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        if let Some(dir) = path.parent() {
                            by_dir
                                .entry(dir.to_path_buf())
                                .or_default()
                                .push(path.to_path_buf());
                        }
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    self.warnings.push(warning);
                }
            }
        }

        self.packages = by_dir
            .into_iter()
            .map(|(path, mut files)| {
                files.sort();
                let name = Self::package_name(&path);
                debug!("Indexed package {} at {} ({} files)", name, path.display(), files.len());
                PackageInfo { path, name, files }
            })
            .collect();
    }

    fn package_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "crate".to_string())
    }

    /// Parses every `.rs` file directly inside `pkg_path`.
    ///
    /// Directories that were not indexed (for example a path outside the
    /// project root) are read directly. Results are cached per path.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the directory or a file cannot be read and
    /// `SyntaxError` if a file is not valid Rust.
    pub fn get_pkg_ast(&mut self, pkg_path: &str) -> Result<Rc<PackageAst>> {
        let path = PathBuf::from(pkg_path);
        if let Some(cached) = self.cache.get(&path) {
            return Ok(Rc::clone(cached));
        }

        let files = match self.package(pkg_path) {
            Some(package) => package.files.clone(),
            None => Self::list_rust_files(&path)?,
        };

        let mut asts = BTreeMap::new();
        for file in &files {
            let syntax_tree = Self::parse_file(file)?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            asts.insert(name, syntax_tree);
        }
        debug!("Loaded package {} ({} files)", path.display(), asts.len());

        let ast = Rc::new(PackageAst {
            path: path.clone(),
            files: asts,
        });
        self.cache.insert(path, Rc::clone(&ast));
        Ok(ast)
    }

    fn list_rust_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Parses a single Rust source file into a syntax tree.
    pub fn parse_file(path: &Path) -> Result<syn::File> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)?;
        syn::parse_file(&content).map_err(|e| Error::SyntaxError {
            file: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
