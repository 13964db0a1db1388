//! Output bundle: the files one run writes.
//!
//! Per-type layout writes `<Name>.ts` for every declaration; single-file
//! layout writes every declaration into one module. Both add `runtime.ts`
//! and an `index.ts` re-exporting every module in emission order.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::config::Layout;
use crate::diagnostic::GeneratorError;
use crate::emit::dialect::dialect_for;
use crate::emit::{EmitOptions, EmittedType};

pub const HEADER: &str = "// Generated by typebridge. Do not edit.\n";
pub const RUNTIME_FILE: &str = "runtime.ts";
pub const INDEX_FILE: &str = "index.ts";

/// Generated files, in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    /// (file name relative to the output directory, content)
    pub files: Vec<(String, String)>,
}

impl Bundle {
    /// Lays out emitted declarations, which must already be in emission order.
    pub fn assemble(
        emitted: &[EmittedType],
        layout: Layout,
        output_file: &str,
        options: &EmitOptions,
    ) -> Result<Self, GeneratorError> {
        let dialect = dialect_for(options.dialect);
        let mut files = Vec::with_capacity(emitted.len() + 2);
        files.push((RUNTIME_FILE.to_string(), dialect.runtime().to_string()));

        let modules: Vec<String> = match layout {
            Layout::PerType => {
                check_module_names(emitted)?;
                for ty in emitted {
                    files.push((format!("{}.ts", ty.name), per_type_module(ty, options)));
                }
                emitted.iter().map(|ty| ty.name.clone()).collect()
            }
            Layout::SingleFile => {
                let module = output_file.strip_suffix(".ts").unwrap_or(output_file);
                if output_file == RUNTIME_FILE || output_file == INDEX_FILE || module.is_empty() || module.contains('/') {
                    return Err(GeneratorError::InvalidConfig {
                        message: format!("output_file '{}' is not a usable module name", output_file),
                    });
                }
                files.push((format!("{}.ts", module), single_module(emitted, options)));
                vec![module.to_string()]
            }
        };

        let mut index = String::from(HEADER);
        index.push_str("export * from './runtime';\n");
        for module in &modules {
            index.push_str(&format!("export * from './{}';\n", module));
        }
        files.push((INDEX_FILE.to_string(), index));

        debug!(files = files.len(), "assembled bundle");
        Ok(Self { files })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|(file, _)| file == name)
            .map(|(_, content)| content.as_str())
    }

    /// Writes every file under `out_dir`, creating it if needed.
    pub fn write(&self, out_dir: &Path) -> Result<(), GeneratorError> {
        std::fs::create_dir_all(out_dir).map_err(|e| GeneratorError::io(out_dir, e.to_string()))?;

        for (filename, content) in &self.files {
            let path = out_dir.join(filename);
            std::fs::write(&path, content).map_err(|e| GeneratorError::io(&path, e.to_string()))?;
            debug!(path = %path.display(), bytes = content.len(), "wrote file");
        }

        Ok(())
    }
}

fn per_type_module(ty: &EmittedType, options: &EmitOptions) -> String {
    let dialect = dialect_for(options.dialect);
    let mut out = String::from(HEADER);
    for line in dialect.imports(ty.branded) {
        out.push_str(&line);
        out.push('\n');
    }
    for dep in &ty.deps {
        out.push_str(&format!(
            "import {{ type {0}, {1} }} from './{0}';\n",
            dep,
            dialect.validator_name(dep)
        ));
    }
    out.push('\n');
    out.push_str(&ty.type_source);
    out.push('\n');
    out.push_str(&ty.validator_source);
    out
}

fn single_module(emitted: &[EmittedType], options: &EmitOptions) -> String {
    let dialect = dialect_for(options.dialect);
    let mut out = String::from(HEADER);
    for line in dialect.imports(emitted.iter().any(|ty| ty.branded)) {
        out.push_str(&line);
        out.push('\n');
    }
    for ty in emitted {
        out.push('\n');
        out.push_str(&ty.type_source);
        out.push('\n');
        out.push_str(&ty.validator_source);
    }
    out
}

/// Module files must stay distinct on case-insensitive file systems and
/// must not shadow the runtime or index modules.
fn check_module_names(emitted: &[EmittedType]) -> Result<(), GeneratorError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    seen.insert("runtime".to_string(), "the runtime module");
    seen.insert("index".to_string(), "the index module");

    let mut errors = Vec::new();
    for ty in emitted {
        let key = ty.name.to_lowercase();
        match seen.get(&key) {
            Some(owner) => errors.push(GeneratorError::invalid(
                ty.name.as_str(),
                format!("module file '{}.ts' collides with {}", ty.name, owner),
            )),
            None => {
                seen.insert(key, &ty.name);
            }
        }
    }
    GeneratorError::collect(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorDialect;
    use crate::emit::emit;
    use crate::ir::{FieldDecl, Primitive, TypeDecl, TypeRef};
    use tempfile::TempDir;

    fn emitted(options: &EmitOptions) -> Vec<EmittedType> {
        vec![
            emit(&TypeDecl::newtype("UserId", Primitive::U32, true), options).unwrap(),
            emit(
                &TypeDecl::structure("User", vec![FieldDecl::new("id", TypeRef::named("UserId"))]),
                options,
            )
            .unwrap(),
        ]
    }

    #[test]
    fn test_per_type_layout() {
        let options = EmitOptions::default();
        let bundle = Bundle::assemble(&emitted(&options), Layout::PerType, "types.ts", &options).unwrap();

        let names: Vec<&str> = bundle.files.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["runtime.ts", "UserId.ts", "User.ts", "index.ts"]);

        let user = bundle.get("User.ts").unwrap();
        assert!(user.starts_with(HEADER));
        assert!(user.contains("import { v, type Validator } from './runtime';"));
        assert!(user.contains("import { type UserId, validateUserId } from './UserId';"));

        let user_id = bundle.get("UserId.ts").unwrap();
        assert!(user_id.contains("import { v, type Validator, type Brand } from './runtime';"));

        assert_eq!(
            bundle.get("index.ts").unwrap(),
            format!("{}export * from './runtime';\nexport * from './UserId';\nexport * from './User';\n", HEADER)
        );
    }

    #[test]
    fn test_single_file_layout() {
        let options = EmitOptions {
            dialect: ValidatorDialect::Zod,
            jsdoc: true,
        };
        let bundle = Bundle::assemble(&emitted(&options), Layout::SingleFile, "bindings.ts", &options).unwrap();
        let names: Vec<&str> = bundle.files.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["runtime.ts", "bindings.ts", "index.ts"]);

        let module = bundle.get("bindings.ts").unwrap();
        assert!(module.contains("import { z } from 'zod';"));
        assert!(module.contains("import type { Brand } from './runtime';"));
        let user_id = module.find("export type UserId").unwrap();
        let user = module.find("export interface User").unwrap();
        assert!(user_id < user);
    }

    #[test]
    fn test_module_name_collisions() {
        let options = EmitOptions::default();
        let decls = [
            TypeDecl::structure("User", vec![]),
            TypeDecl::structure("USER", vec![]),
            TypeDecl::structure("index", vec![]),
        ];
        let emitted: Vec<EmittedType> = decls.iter().map(|d| emit(d, &options).unwrap()).collect();
        let err = Bundle::assemble(&emitted, Layout::PerType, "types.ts", &options).unwrap_err();
        assert_eq!(err.iter().len(), 2);
    }

    #[test]
    fn test_write() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("bindings");
        let options = EmitOptions::default();
        let bundle = Bundle::assemble(&emitted(&options), Layout::PerType, "types.ts", &options).unwrap();
        bundle.write(&out).unwrap();

        assert!(out.join("runtime.ts").exists());
        assert_eq!(std::fs::read_to_string(out.join("User.ts")).unwrap(), bundle.get("User.ts").unwrap());
    }
}
