use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in file {file}: {message}")]
    SourceParse { file: PathBuf, message: String },

    #[error("Unknown field type `{label}` for {struct_name}.{field}")]
    UnknownFieldType {
        struct_name: String,
        field: String,
        label: String,
    },

    #[error("Embedded package `{package}` not found on disk (searched {searched})")]
    EmbeddedPackageUnresolved { package: String, searched: PathBuf },

    #[error("Enum `{0}` was mutated after its display values were baked")]
    EnumAlreadyBaked(String),

    #[error("Illegal enum `{enum_name}`: {message}")]
    IllegalEnum { enum_name: String, message: String },

    #[error("Tree construction failed for enum `{enum_name}`: {message}")]
    TreeBuild { enum_name: String, message: String },

    #[error("Synthesized key `{key}` collides with an existing key in enum `{enum_name}`")]
    SynthesisCollision { enum_name: String, key: String },

    #[error("Formatter rejected generated output: {0}")]
    FormatRejected(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("No artifacts could be produced: {0}")]
    NothingProduced(String),
}

pub type Result<T> = std::result::Result<T, CodegenError>;

impl CodegenError {
    pub fn source_parse(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CodegenError::SourceParse {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn unknown_field_type(
        struct_name: impl Into<String>,
        field: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        CodegenError::UnknownFieldType {
            struct_name: struct_name.into(),
            field: field.into(),
            label: label.into(),
        }
    }

    pub fn embedded_package_unresolved(
        package: impl Into<String>,
        searched: impl Into<PathBuf>,
    ) -> Self {
        CodegenError::EmbeddedPackageUnresolved {
            package: package.into(),
            searched: searched.into(),
        }
    }

    pub fn illegal_enum(enum_name: impl Into<String>, message: impl Into<String>) -> Self {
        CodegenError::IllegalEnum {
            enum_name: enum_name.into(),
            message: message.into(),
        }
    }

    pub fn tree_build(enum_name: impl Into<String>, message: impl Into<String>) -> Self {
        CodegenError::TreeBuild {
            enum_name: enum_name.into(),
            message: message.into(),
        }
    }

    pub fn synthesis_collision(enum_name: impl Into<String>, key: impl Into<String>) -> Self {
        CodegenError::SynthesisCollision {
            enum_name: enum_name.into(),
            key: key.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        CodegenError::Config(message.into())
    }

    pub fn nothing_produced(message: impl Into<String>) -> Self {
        CodegenError::NothingProduced(message.into())
    }
}
