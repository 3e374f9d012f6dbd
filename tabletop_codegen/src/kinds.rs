//! The closed registry of property kinds the framework recognizes.
//!
//! Twelve kinds: four scalars, their four slice forms, and four container
//! kinds (enum value, stack, board, timer). Containers expose an immutable
//! and a mutable facade and may carry sub-type coercions (a sized or merged
//! stack, a range or tree enum value). The registry drives every shape the
//! reader emitter prints: labels, method stems, `PropertyValue` variants,
//! and zero literals.

/// One of the twelve property kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyKind {
    Bool,
    Int,
    String,
    PlayerIndex,
    BoolSlice,
    IntSlice,
    StringSlice,
    PlayerIndexSlice,
    Enum,
    Stack,
    Board,
    Timer,
}

/// A narrower container variant the configurer may down-convert to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubType {
    Sized,
    Merged,
    Range,
    Tree,
}

/// Result of classifying a declared-type label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: PropertyKind,
    pub mutable: bool,
    pub sub_type: Option<SubType>,
}

impl PropertyKind {
    /// Every kind, in the stable order generated dispatch arms follow.
    pub const ALL: [PropertyKind; 12] = [
        PropertyKind::Bool,
        PropertyKind::Int,
        PropertyKind::String,
        PropertyKind::PlayerIndex,
        PropertyKind::BoolSlice,
        PropertyKind::IntSlice,
        PropertyKind::StringSlice,
        PropertyKind::PlayerIndexSlice,
        PropertyKind::Enum,
        PropertyKind::Stack,
        PropertyKind::Board,
        PropertyKind::Timer,
    ];

    /// The four container kinds, in [`Self::ALL`] order.
    pub const CONTAINERS: [PropertyKind; 4] = [
        PropertyKind::Enum,
        PropertyKind::Stack,
        PropertyKind::Board,
        PropertyKind::Timer,
    ];

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            PropertyKind::Enum | PropertyKind::Stack | PropertyKind::Board | PropertyKind::Timer
        )
    }

    /// The type label printed for the immutable facade (scalars have one
    /// label for both facades).
    pub fn immutable_label(&self) -> &'static str {
        match self {
            PropertyKind::Bool => "bool",
            PropertyKind::Int => "i64",
            PropertyKind::String => "String",
            PropertyKind::PlayerIndex => "PlayerIndex",
            PropertyKind::BoolSlice => "Vec<bool>",
            PropertyKind::IntSlice => "Vec<i64>",
            PropertyKind::StringSlice => "Vec<String>",
            PropertyKind::PlayerIndexSlice => "Vec<PlayerIndex>",
            PropertyKind::Enum => "ImmutableEnumVal",
            PropertyKind::Stack => "ImmutableStack",
            PropertyKind::Board => "ImmutableBoard",
            PropertyKind::Timer => "ImmutableTimer",
        }
    }

    /// The type label printed for the mutable facade.
    pub fn mutable_label(&self) -> &'static str {
        match self {
            PropertyKind::Enum => "EnumVal",
            PropertyKind::Stack => "Stack",
            PropertyKind::Board => "Board",
            PropertyKind::Timer => "Timer",
            scalar => scalar.immutable_label(),
        }
    }

    /// Short name used to form generated method names (`bool_prop`,
    /// `configure_stack_prop`, …).
    pub fn method_key(&self) -> &'static str {
        match self {
            PropertyKind::Bool => "bool",
            PropertyKind::Int => "int",
            PropertyKind::String => "string",
            PropertyKind::PlayerIndex => "player_index",
            PropertyKind::BoolSlice => "bool_slice",
            PropertyKind::IntSlice => "int_slice",
            PropertyKind::StringSlice => "string_slice",
            PropertyKind::PlayerIndexSlice => "player_index_slice",
            PropertyKind::Enum => "enum_val",
            PropertyKind::Stack => "stack",
            PropertyKind::Board => "board",
            PropertyKind::Timer => "timer",
        }
    }

    /// `PropertyKind::…` path printed into generated `props()` tables.
    pub fn variant_path(&self) -> &'static str {
        match self {
            PropertyKind::Bool => "PropertyKind::Bool",
            PropertyKind::Int => "PropertyKind::Int",
            PropertyKind::String => "PropertyKind::String",
            PropertyKind::PlayerIndex => "PropertyKind::PlayerIndex",
            PropertyKind::BoolSlice => "PropertyKind::BoolSlice",
            PropertyKind::IntSlice => "PropertyKind::IntSlice",
            PropertyKind::StringSlice => "PropertyKind::StringSlice",
            PropertyKind::PlayerIndexSlice => "PropertyKind::PlayerIndexSlice",
            PropertyKind::Enum => "PropertyKind::Enum",
            PropertyKind::Stack => "PropertyKind::Stack",
            PropertyKind::Board => "PropertyKind::Board",
            PropertyKind::Timer => "PropertyKind::Timer",
        }
    }

    /// `PropertyValue` variant wrapping the immutable facade.
    pub fn value_variant_immutable(&self) -> &'static str {
        match self {
            PropertyKind::Bool => "Bool",
            PropertyKind::Int => "Int",
            PropertyKind::String => "String",
            PropertyKind::PlayerIndex => "PlayerIndex",
            PropertyKind::BoolSlice => "BoolSlice",
            PropertyKind::IntSlice => "IntSlice",
            PropertyKind::StringSlice => "StringSlice",
            PropertyKind::PlayerIndexSlice => "PlayerIndexSlice",
            PropertyKind::Enum => "ImmutableEnumVal",
            PropertyKind::Stack => "ImmutableStack",
            PropertyKind::Board => "ImmutableBoard",
            PropertyKind::Timer => "ImmutableTimer",
        }
    }

    /// `PropertyValue` variant wrapping the mutable facade.
    pub fn value_variant_mutable(&self) -> &'static str {
        match self {
            PropertyKind::Enum => "EnumVal",
            PropertyKind::Stack => "Stack",
            PropertyKind::Board => "Board",
            PropertyKind::Timer => "Timer",
            scalar => scalar.value_variant_immutable(),
        }
    }

    /// A literal of this kind printable in any expression position.
    pub fn zero_literal(&self) -> &'static str {
        match self {
            PropertyKind::Bool => "false",
            PropertyKind::Int => "0",
            PropertyKind::String => "String::new()",
            PropertyKind::PlayerIndex => "PlayerIndex::default()",
            PropertyKind::BoolSlice
            | PropertyKind::IntSlice
            | PropertyKind::StringSlice
            | PropertyKind::PlayerIndexSlice => "Vec::new()",
            PropertyKind::Enum => "EnumVal::default()",
            PropertyKind::Stack => "Stack::default()",
            PropertyKind::Board => "Board::default()",
            PropertyKind::Timer => "Timer::default()",
        }
    }

    /// Whether the kind's scalar value is `Copy` in generated getters
    /// (everything else clones).
    pub fn is_copy(&self) -> bool {
        matches!(
            self,
            PropertyKind::Bool | PropertyKind::Int | PropertyKind::PlayerIndex
        )
    }

    /// Sub-type coercions recognized for this kind, in stable order.
    pub fn sub_types(&self) -> &'static [SubType] {
        match self {
            PropertyKind::Stack => &[SubType::Sized, SubType::Merged],
            PropertyKind::Enum => &[SubType::Range, SubType::Tree],
            _ => &[],
        }
    }
}

impl SubType {
    pub fn immutable_label(&self) -> &'static str {
        match self {
            SubType::Sized => "ImmutableSizedStack",
            SubType::Merged => "MergedStack",
            SubType::Range => "ImmutableRangeVal",
            SubType::Tree => "ImmutableTreeVal",
        }
    }

    /// Merged stacks have no mutable facade.
    pub fn mutable_label(&self) -> Option<&'static str> {
        match self {
            SubType::Sized => Some("SizedStack"),
            SubType::Merged => None,
            SubType::Range => Some("RangeVal"),
            SubType::Tree => Some("TreeVal"),
        }
    }

    /// Method the configurer invokes to down-convert an immutable facade.
    pub fn immutable_coercion(&self) -> &'static str {
        match self {
            SubType::Sized => "as_immutable_sized",
            SubType::Merged => "as_merged",
            SubType::Range => "as_immutable_range",
            SubType::Tree => "as_immutable_tree",
        }
    }

    /// Method the configurer invokes to down-convert a mutable facade.
    pub fn mutable_coercion(&self) -> Option<&'static str> {
        match self {
            SubType::Sized => Some("as_sized"),
            SubType::Merged => None,
            SubType::Range => Some("as_range"),
            SubType::Tree => Some("as_tree"),
        }
    }
}

/// Maps a declared-type label (with or without the `Vec<…>` slice qualifier)
/// to its kind, mutability, and sub-type. The mapping is fixed and closed;
/// unknown labels return `None` and the caller drops the field.
pub fn classify_label(label: &str) -> Option<Classification> {
    if let Some(inner) = label
        .strip_prefix("Vec<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        let kind = match inner.trim() {
            "bool" => PropertyKind::BoolSlice,
            "i64" => PropertyKind::IntSlice,
            "String" => PropertyKind::StringSlice,
            "PlayerIndex" => PropertyKind::PlayerIndexSlice,
            _ => return None,
        };
        return Some(Classification {
            kind,
            mutable: true,
            sub_type: None,
        });
    }

    let (kind, mutable, sub_type) = match label {
        "bool" => (PropertyKind::Bool, true, None),
        "i64" => (PropertyKind::Int, true, None),
        "String" => (PropertyKind::String, true, None),
        "PlayerIndex" => (PropertyKind::PlayerIndex, true, None),
        "EnumVal" => (PropertyKind::Enum, true, None),
        "ImmutableEnumVal" => (PropertyKind::Enum, false, None),
        "RangeVal" => (PropertyKind::Enum, true, Some(SubType::Range)),
        "ImmutableRangeVal" => (PropertyKind::Enum, false, Some(SubType::Range)),
        "TreeVal" => (PropertyKind::Enum, true, Some(SubType::Tree)),
        "ImmutableTreeVal" => (PropertyKind::Enum, false, Some(SubType::Tree)),
        "Stack" => (PropertyKind::Stack, true, None),
        "ImmutableStack" => (PropertyKind::Stack, false, None),
        "SizedStack" => (PropertyKind::Stack, true, Some(SubType::Sized)),
        "ImmutableSizedStack" => (PropertyKind::Stack, false, Some(SubType::Sized)),
        "MergedStack" => (PropertyKind::Stack, false, Some(SubType::Merged)),
        "Board" => (PropertyKind::Board, true, None),
        "ImmutableBoard" => (PropertyKind::Board, false, None),
        "Timer" => (PropertyKind::Timer, true, None),
        "ImmutableTimer" => (PropertyKind::Timer, false, None),
        _ => return None,
    };

    Some(Classification {
        kind,
        mutable,
        sub_type,
    })
}
