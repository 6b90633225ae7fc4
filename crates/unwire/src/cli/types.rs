//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::domain::DependencyKind;

/// Dependency kind for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKindArg {
    /// An installable module
    #[value(alias = "provider")]
    Module,
    /// An installable theme
    Theme,
    /// A configuration entity
    #[value(alias = "config-object")]
    Config,
    /// A content record (`entity_type:bundle:uuid`)
    Content,
}

impl From<DependencyKindArg> for DependencyKind {
    fn from(arg: DependencyKindArg) -> Self {
        match arg {
            DependencyKindArg::Module => DependencyKind::Module,
            DependencyKindArg::Theme => DependencyKind::Theme,
            DependencyKindArg::Config => DependencyKind::Config,
            DependencyKindArg::Content => DependencyKind::Content,
        }
    }
}

/// Extension kind for the `uninstall` command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKindArg {
    /// A module
    Module,
    /// A theme
    Theme,
}

impl From<ExtensionKindArg> for DependencyKind {
    fn from(arg: ExtensionKindArg) -> Self {
        match arg {
            ExtensionKindArg::Module => DependencyKind::Module,
            ExtensionKindArg::Theme => DependencyKind::Theme,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DependencyKindArg::Module, DependencyKind::Module)]
    #[case(DependencyKindArg::Theme, DependencyKind::Theme)]
    #[case(DependencyKindArg::Config, DependencyKind::Config)]
    #[case(DependencyKindArg::Content, DependencyKind::Content)]
    fn test_dependency_kind_conversion(#[case] arg: DependencyKindArg, #[case] expected: DependencyKind) {
        assert_eq!(DependencyKind::from(arg), expected);
    }
}
