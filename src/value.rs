//! Values that fill template holes

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures_channel::oneshot;

use crate::dom::{NodeId, Tree};
use crate::error::ParseError;
use crate::parser::parse_fragment;
use crate::template::TemplateResult;

/// Scalar values, rendered as text
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Null,
    Bool(bool),
    /// Integers, kept exact
    Int(i128),
    Number(f64),
    Str(String),
}

impl Primitive {
    /// Text as it appears in the output; `Null` is empty
    pub fn to_text(&self) -> String {
        match self {
            Primitive::Null => String::new(),
            Primitive::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Null => Ok(()),
            Primitive::Bool(b) => write!(f, "{b}"),
            Primitive::Int(n) => write!(f, "{n}"),
            Primitive::Number(n) => format_number(*n, f),
            Primitive::Str(s) => f.write_str(s),
        }
    }
}

/// Numbers the way a script engine prints them: `3`, `0.5`, `-0`→`0`,
/// `NaN`, `1e+21`, `1e-7`
///
/// Starts from the shortest round-tripping digits and places the decimal
/// point by the exponent: plain notation for exponents from -7 to 20,
/// exponent notation outside that.
fn format_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        return f.write_str("NaN");
    } else if n.is_infinite() {
        return f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    } else if n == 0.0 {
        return f.write_str("0");
    }

    let scientific = format!("{:e}", n.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let count = digits.len() as i32;
    // Digits before the decimal point
    let point = exponent.parse::<i32>().unwrap_or(0) + 1;

    if n < 0.0 {
        f.write_str("-")?;
    }
    if count <= point && point <= 21 {
        write!(f, "{digits}{}", "0".repeat((point - count) as usize))
    } else if 0 < point && point <= 21 {
        let (whole, fraction) = digits.split_at(point as usize);
        write!(f, "{whole}.{fraction}")
    } else if -6 < point && point <= 0 {
        write!(f, "0.{}{digits}", "0".repeat(-point as usize))
    } else {
        let (first, rest) = digits.split_at(1);
        let sign = if point > 0 { '+' } else { '-' };
        let exponent = (point - 1).abs();
        if rest.is_empty() {
            write!(f, "{first}e{sign}{exponent}")
        } else {
            write!(f, "{first}.{rest}e{sign}{exponent}")
        }
    }
}

/// A value bound to a hole
///
/// Template results and iterables are rebuilt on every evaluation, so they
/// never count as unchanged; everything else compares by value or by
/// allocation, see [`Value::same`].
#[derive(Clone)]
pub enum Value {
    Primitive(Primitive),
    /// A nested template, rendered in place
    Template(TemplateResult),
    /// Items rendered one after the other
    Iterable(Vec<Value>),
    /// Prebuilt nodes, copied in unescaped
    Node(Fragment),
    /// A value that arrives later
    Pending(Deferred),
    /// A placeholder shown until `pending` settles
    Until {
        pending: Deferred,
        placeholder: Box<Value>,
    },
    /// Leaves an attribute out entirely; renders nothing between nodes
    Absent,
    /// Anything else, rendered through its `Display` impl
    Display(Rc<dyn fmt::Display>),
}

impl Value {
    pub const NULL: Value = Value::Primitive(Primitive::Null);

    /// Wrap any `Display` type as a text value
    pub fn display<T: fmt::Display + 'static>(value: T) -> Self {
        Value::Display(Rc::new(value))
    }

    /// Collect any iterable into [`Value::Iterable`]
    pub fn iter<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Value::Iterable(items.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Primitive(Primitive::Null))
    }

    /// Check if rendering `other` in place of `self` would change nothing
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Primitive(a), Value::Primitive(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a.ptr_eq(b),
            (Value::Pending(a), Value::Pending(b)) => a.ptr_eq(b),
            (
                Value::Until {
                    pending: a,
                    placeholder: x,
                },
                Value::Until {
                    pending: b,
                    placeholder: y,
                },
            ) => a.ptr_eq(b) && x.same(y),
            (Value::Absent, Value::Absent) => true,
            (Value::Display(a), Value::Display(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Coerce to attribute text
    ///
    /// Iterables join their items with `,` and `Until` uses its
    /// placeholder. Templates, nodes and pending values have no text form
    /// and coerce to the empty string.
    pub(crate) fn to_attribute_text(&self) -> String {
        match self {
            Value::Primitive(p) => p.to_text(),
            Value::Absent => String::new(),
            Value::Until { placeholder, .. } => placeholder.to_attribute_text(),
            Value::Display(d) => d.to_string(),
            Value::Iterable(items) => items
                .iter()
                .map(Value::to_attribute_text)
                .collect::<Vec<_>>()
                .join(","),
            Value::Template(_) | Value::Node(_) | Value::Pending(_) => {
                log::warn!(
                    target: "ssr_html::part",
                    "{} value in attribute position renders as empty",
                    self.kind_name()
                );
                String::new()
            }
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Value::Primitive(_) => "primitive",
            Value::Template(_) => "template",
            Value::Iterable(_) => "iterable",
            Value::Node(_) => "node",
            Value::Pending(_) => "pending",
            Value::Until { .. } => "until",
            Value::Absent => "absent",
            Value::Display(_) => "display",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::NULL
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Primitive(p) => f.debug_tuple("Primitive").field(p).finish(),
            Value::Template(t) => f.debug_tuple("Template").field(t).finish(),
            Value::Iterable(items) => f.debug_tuple("Iterable").field(items).finish(),
            Value::Node(n) => f.debug_tuple("Node").field(n).finish(),
            Value::Pending(d) => f.debug_tuple("Pending").field(d).finish(),
            Value::Until {
                pending,
                placeholder,
            } => f
                .debug_struct("Until")
                .field("pending", pending)
                .field("placeholder", placeholder)
                .finish(),
            Value::Absent => f.write_str("Absent"),
            Value::Display(d) => f.debug_tuple("Display").field(&d.to_string()).finish(),
        }
    }
}

impl From<Primitive> for Value {
    fn from(p: Primitive) -> Self {
        Value::Primitive(p)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Primitive(Primitive::Str(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Primitive(Primitive::Str(s))
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Primitive(Primitive::Str(s.clone()))
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Primitive(Primitive::Str(c.to_string()))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Primitive(Primitive::Bool(b))
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::NULL
    }
}

macro_rules! number_from {
    ($variant:ident as $repr:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Primitive(Primitive::$variant(<$repr>::from(n)))
                }
            }
        )*
    };
}

number_from!(Int as i128: i8, i16, i32, i64, u8, u16, u32, u64);
number_from!(Number as f64: f32, f64);

impl From<isize> for Value {
    fn from(n: isize) -> Self {
        Value::Primitive(Primitive::Int(n as i128))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Primitive(Primitive::Int(n as i128))
    }
}

impl From<i128> for Value {
    fn from(n: i128) -> Self {
        Value::Primitive(Primitive::Int(n))
    }
}

impl From<TemplateResult> for Value {
    fn from(t: TemplateResult) -> Self {
        Value::Template(t)
    }
}

impl From<Fragment> for Value {
    fn from(f: Fragment) -> Self {
        Value::Node(f)
    }
}

impl From<Deferred> for Value {
    fn from(d: Deferred) -> Self {
        Value::Pending(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map_or(Value::NULL, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::iter(items)
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(items: I) -> Self {
        Value::iter(items)
    }
}

struct FragmentInner {
    tree: Tree,
    root: NodeId,
}

/// Prebuilt nodes bound as a value
///
/// The nodes are copied into the render tree, so one fragment can be
/// rendered any number of times. Clones share the same nodes.
#[derive(Clone)]
pub struct Fragment(Rc<FragmentInner>);

impl Fragment {
    /// Wrap the subtree at `root`; a fragment or document root contributes its children
    pub fn new(tree: Tree, root: NodeId) -> Self {
        Self(Rc::new(FragmentInner { tree, root }))
    }

    /// Parse trusted markup into nodes
    pub fn parse(markup: &str) -> Result<Self, Vec<ParseError>> {
        let (tree, root) = parse_fragment(markup)?;
        Ok(Self::new(tree, root))
    }

    pub fn tree(&self) -> &Tree {
        &self.0.tree
    }

    pub fn root(&self) -> NodeId {
        self.0.root
    }

    pub fn ptr_eq(&self, other: &Fragment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("nodes", &self.0.tree.len())
            .finish()
    }
}

/// Create a pending value and the handle that settles it
pub fn deferred() -> (Resolver, Deferred) {
    let (sender, receiver) = oneshot::channel();
    let deferred = Deferred(Rc::new(RefCell::new(DeferredState::Waiting(receiver))));
    (Resolver { sender }, deferred)
}

/// Settles a [`Deferred`]; dropping it unresolved rejects
#[derive(Debug)]
pub struct Resolver {
    sender: oneshot::Sender<Value>,
}

impl Resolver {
    pub fn resolve(self, value: impl Into<Value>) {
        if self.sender.send(value.into()).is_err() {
            log::trace!(target: "ssr_html::part", "resolved a deferred nobody holds");
        }
    }

    pub fn reject(self) {}
}

#[derive(Debug)]
enum DeferredState {
    Waiting(oneshot::Receiver<Value>),
    Fulfilled(Value),
    Rejected,
}

/// Outcome of polling a [`Deferred`]
#[derive(Debug, Clone)]
pub enum Settlement {
    Waiting,
    Fulfilled(Value),
    Rejected,
}

/// A value that is not known yet
///
/// Clones observe the same outcome, which is cached once seen.
#[derive(Clone)]
pub struct Deferred(Rc<RefCell<DeferredState>>);

impl Deferred {
    /// A deferred that is already fulfilled
    pub fn resolved(value: impl Into<Value>) -> Self {
        Self(Rc::new(RefCell::new(DeferredState::Fulfilled(value.into()))))
    }

    /// Check for an outcome without blocking
    pub fn poll(&self) -> Settlement {
        let mut state = self.0.borrow_mut();
        let received = match &mut *state {
            DeferredState::Waiting(receiver) => Some(receiver.try_recv()),
            _ => None,
        };
        match received {
            Some(Ok(Some(value))) => *state = DeferredState::Fulfilled(value),
            Some(Err(oneshot::Canceled)) => *state = DeferredState::Rejected,
            Some(Ok(None)) | None => {}
        }
        match &*state {
            DeferredState::Waiting(_) => Settlement::Waiting,
            DeferredState::Fulfilled(value) => Settlement::Fulfilled(value.clone()),
            DeferredState::Rejected => Settlement::Rejected,
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self.poll(), Settlement::Waiting)
    }

    pub fn ptr_eq(&self, other: &Deferred) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.0.borrow() {
            DeferredState::Waiting(_) => "waiting",
            DeferredState::Fulfilled(_) => "fulfilled",
            DeferredState::Rejected => "rejected",
        };
        f.debug_tuple("Deferred").field(&state).finish()
    }
}
