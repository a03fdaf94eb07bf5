//! Interaction trees of scenario charts.
//!
//! A chart is an [`InteractionFragment`]: an ordered sequence of
//! [`Interaction`]s. Leaves are modal signals, delays and resets; combined
//! fragments own further fragments, and references point at other scenarios
//! of the same package by name.

use crate::expression::Expression;

/// Strict (hot) or permissive (cold) expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "lowercase"))]
pub enum Modality {
    Hot,
    Cold,
}

/// Direction of a signal, seen from the monitored component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "lowercase"))]
pub enum Direction {
    Send,
    Receive,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal {
    pub direction: Direction,
    pub modality: Modality,
    pub port: String,
    pub event: String,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Delay {
    pub modality: Modality,
    pub minimum: Expression,
    pub maximum: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Reset {
    pub modality: Modality,
}

/// Modal interaction leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Leaf {
    Signal(Signal),
    Delay(Delay),
    Reset(Reset),
}

impl Leaf {
    pub fn send(port: impl Into<String>, event: impl Into<String>) -> Self {
        Leaf::Signal(Signal {
            direction: Direction::Send,
            modality: Modality::Hot,
            port: port.into(),
            event: event.into(),
            arguments: Vec::new(),
        })
    }

    pub fn receive(port: impl Into<String>, event: impl Into<String>) -> Self {
        Leaf::Signal(Signal {
            direction: Direction::Receive,
            modality: Modality::Hot,
            port: port.into(),
            event: event.into(),
            arguments: Vec::new(),
        })
    }

    pub fn delay(minimum: Expression, maximum: Option<Expression>) -> Self {
        Leaf::Delay(Delay {
            modality: Modality::Hot,
            minimum,
            maximum,
        })
    }

    pub fn reset() -> Self {
        Leaf::Reset(Reset {
            modality: Modality::Hot,
        })
    }

    pub fn modality(&self) -> Modality {
        match self {
            Leaf::Signal(s) => s.modality,
            Leaf::Delay(d) => d.modality,
            Leaf::Reset(r) => r.modality,
        }
    }
}

/// Member of a [`Interaction::Set`]: a leaf or a negated leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum InteractionDefinition {
    Leaf(Leaf),
    Negated(Leaf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum FragmentKind {
    Alternative,
    Optional,
    Loop,
    Parallel,
    Unordered,
}

impl std::fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FragmentKind::Alternative => "alternative",
            FragmentKind::Optional => "optional",
            FragmentKind::Loop => "loop",
            FragmentKind::Parallel => "parallel",
            FragmentKind::Unordered => "unordered",
        };
        f.write_str(name)
    }
}

/// Repeat-count bounds of a loop fragment. A missing maximum means exactly
/// `minimum` repetitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LoopBounds {
    pub minimum: Expression,
    pub maximum: Option<Expression>,
}

/// Combined fragment: a control node over ordered sub-fragments.
///
/// `bounds` is set exactly when `kind` is [`FragmentKind::Loop`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct CombinedFragment {
    pub kind: FragmentKind,
    pub fragments: Vec<InteractionFragment>,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub bounds: Option<LoopBounds>,
}

impl CombinedFragment {
    pub fn new(kind: FragmentKind, fragments: Vec<InteractionFragment>) -> Self {
        Self {
            kind,
            fragments,
            bounds: None,
        }
    }

    pub fn alternative(branches: Vec<InteractionFragment>) -> Self {
        Self::new(FragmentKind::Alternative, branches)
    }

    pub fn optional(body: InteractionFragment) -> Self {
        Self::new(FragmentKind::Optional, vec![body])
    }

    pub fn parallel(fragments: Vec<InteractionFragment>) -> Self {
        Self::new(FragmentKind::Parallel, fragments)
    }

    pub fn unordered(fragments: Vec<InteractionFragment>) -> Self {
        Self::new(FragmentKind::Unordered, fragments)
    }

    pub fn looped(minimum: Expression, maximum: Option<Expression>, body: InteractionFragment) -> Self {
        Self {
            kind: FragmentKind::Loop,
            fragments: vec![body],
            bounds: Some(LoopBounds { minimum, maximum }),
        }
    }
}

/// Reference to another scenario of the same package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioReference {
    pub target: String,
    pub arguments: Vec<Expression>,
}

/// One node of an interaction tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Interaction {
    Leaf(Leaf),
    /// The wrapped leaf must not occur.
    Negated(Leaf),
    /// Leaves occurring together within one logical step.
    Set(Vec<InteractionDefinition>),
    Fragment(CombinedFragment),
    Reference(ScenarioReference),
}

impl Interaction {
    pub fn send(port: impl Into<String>, event: impl Into<String>) -> Self {
        Interaction::Leaf(Leaf::send(port, event))
    }

    pub fn receive(port: impl Into<String>, event: impl Into<String>) -> Self {
        Interaction::Leaf(Leaf::receive(port, event))
    }

    pub fn reference(target: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Interaction::Reference(ScenarioReference {
            target: target.into(),
            arguments,
        })
    }

    /// Short human-readable name of the node kind.
    pub fn kind_name(&self) -> String {
        match self {
            Interaction::Leaf(Leaf::Signal(_)) => "signal".into(),
            Interaction::Leaf(Leaf::Delay(_)) => "delay".into(),
            Interaction::Leaf(Leaf::Reset(_)) => "reset".into(),
            Interaction::Negated(_) => "negated interaction".into(),
            Interaction::Set(_) => "interaction set".into(),
            Interaction::Fragment(cf) => format!("{} fragment", cf.kind),
            Interaction::Reference(r) => format!("reference to '{}'", r.target),
        }
    }

    /// Number of nodes in the subtree rooted here (this node included).
    pub fn node_count(&self) -> usize {
        match self {
            Interaction::Fragment(cf) => {
                1 + cf
                    .fragments
                    .iter()
                    .map(InteractionFragment::node_count)
                    .sum::<usize>()
            }
            Interaction::Set(members) => 1 + members.len(),
            _ => 1,
        }
    }

    pub fn contains_reference(&self) -> bool {
        match self {
            Interaction::Reference(_) => true,
            Interaction::Fragment(cf) => cf.fragments.iter().any(InteractionFragment::contains_reference),
            _ => false,
        }
    }
}

/// Ordered sequence of interactions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
pub struct InteractionFragment {
    pub interactions: Vec<Interaction>,
}

impl InteractionFragment {
    pub fn new(interactions: Vec<Interaction>) -> Self {
        Self { interactions }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interaction> {
        self.interactions.iter()
    }

    pub fn node_count(&self) -> usize {
        self.interactions.iter().map(Interaction::node_count).sum()
    }

    pub fn contains_reference(&self) -> bool {
        self.interactions.iter().any(Interaction::contains_reference)
    }
}

impl From<Vec<Interaction>> for InteractionFragment {
    fn from(interactions: Vec<Interaction>) -> Self {
        Self::new(interactions)
    }
}

impl FromIterator<Interaction> for InteractionFragment {
    fn from_iter<I: IntoIterator<Item = Interaction>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for InteractionFragment {
    type Item = Interaction;
    type IntoIter = std::vec::IntoIter<Interaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.interactions.into_iter()
    }
}

impl<'a> IntoIterator for &'a InteractionFragment {
    type Item = &'a Interaction;
    type IntoIter = std::slice::Iter<'a, Interaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.interactions.iter()
    }
}
