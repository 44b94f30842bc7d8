//! Jitsi Videobridge `stats` extension within COnferencing with LIghtweight
//! BRIdging (Colibri).
//!
//! ```xml
//! <stats xmlns='http://jitsi.org/protocol/colibri'>
//!   <stat name='conferences' value='3' />
//!   <stat name='bit_rate_download' value='1024' />
//! </stats>
//! ```

use std::fmt;

use tracing::debug;
use xmpp_parsers::minidom::Element;

use crate::error::ColibriError;

pub const ELEMENT_NAME: &str = "stats";
pub const NAMESPACE: &str = "http://jitsi.org/protocol/colibri";

/// Value of a single statistic. Rendered through [`fmt::Display`].
#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Text(text) => f.write_str(text),
            StatValue::Integer(n) => write!(f, "{n}"),
            StatValue::Float(n) if n.is_infinite() => {
                f.write_str(if n.is_sign_positive() { "Infinity" } else { "-Infinity" })
            }
            StatValue::Float(n) => write!(f, "{n}"),
            StatValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for StatValue {
    fn from(value: &str) -> Self {
        StatValue::Text(value.to_string())
    }
}

impl From<String> for StatValue {
    fn from(value: String) -> Self {
        StatValue::Text(value)
    }
}

impl From<i64> for StatValue {
    fn from(value: i64) -> Self {
        StatValue::Integer(value)
    }
}

impl From<i32> for StatValue {
    fn from(value: i32) -> Self {
        StatValue::Integer(value.into())
    }
}

impl From<u32> for StatValue {
    fn from(value: u32) -> Self {
        StatValue::Integer(value.into())
    }
}

/// Counters above `i64::MAX` keep their exact digits as text.
impl From<u64> for StatValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| StatValue::Text(value.to_string()), StatValue::Integer)
    }
}

impl From<usize> for StatValue {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or_else(|_| StatValue::Text(value.to_string()), StatValue::Integer)
    }
}

impl From<f64> for StatValue {
    fn from(value: f64) -> Self {
        StatValue::Float(value)
    }
}

impl From<bool> for StatValue {
    fn from(value: bool) -> Self {
        StatValue::Boolean(value)
    }
}

/// One `<stat/>` child. Either half may be absent, in which case the stat
/// renders as nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stat {
    pub name: Option<String>,
    pub value: Option<StatValue>,
}

impl Stat {
    pub const ELEMENT_NAME: &'static str = "stat";
    pub const NAME_ATTR_NAME: &'static str = "name";
    pub const VALUE_ATTR_NAME: &'static str = "value";

    pub fn new(name: impl Into<String>, value: impl Into<StatValue>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.name.is_some() && self.value.is_some()
    }

    pub fn to_xml(&self) -> String {
        let (Some(name), Some(value)) = (&self.name, &self.value) else {
            return String::new();
        };
        format!(
            "<{} {}='{}' {}='{}' />",
            Self::ELEMENT_NAME,
            Self::NAME_ATTR_NAME,
            escape_xml(name),
            Self::VALUE_ATTR_NAME,
            escape_xml(&value.to_string())
        )
    }
}

/// Ordered collection of statistics. Duplicate names are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsExtension {
    stats: Vec<Stat>,
}

impl StatsExtension {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, value: impl Into<StatValue>) {
        self.stats.push(Stat::new(name, value));
    }

    pub fn add_stat(&mut self, stat: Stat) {
        self.stats.push(stat);
    }

    pub fn stats(&self) -> &[Stat] {
        &self.stats
    }

    /// Value of the most recently added complete stat called `name`.
    pub fn get(&self, name: &str) -> Option<&StatValue> {
        self.stats
            .iter()
            .rev()
            .filter(|stat| stat.name.as_deref() == Some(name))
            .find_map(|stat| stat.value.as_ref())
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// The `<stat/>` children, in insertion order, with no separators.
    pub fn serialize(&self) -> String {
        self.stats.iter().map(Stat::to_xml).collect()
    }

    /// The full `<stats/>` element.
    pub fn to_xml(&self) -> String {
        let children = self.serialize();
        if children.is_empty() {
            format!("<{ELEMENT_NAME} xmlns='{NAMESPACE}'/>")
        } else {
            format!("<{ELEMENT_NAME} xmlns='{NAMESPACE}'>{children}</{ELEMENT_NAME}>")
        }
    }
}

impl From<&StatsExtension> for Element {
    fn from(extension: &StatsExtension) -> Self {
        let mut builder = Element::builder(ELEMENT_NAME, NAMESPACE);
        for stat in &extension.stats {
            let (Some(name), Some(value)) = (&stat.name, &stat.value) else {
                debug!(name = ?stat.name, "skipping incomplete stat");
                continue;
            };
            builder = builder.append(
                Element::builder(Stat::ELEMENT_NAME, NAMESPACE)
                    .attr(Stat::NAME_ATTR_NAME, name)
                    .attr(Stat::VALUE_ATTR_NAME, value.to_string())
                    .build(),
            );
        }
        builder.build()
    }
}

impl From<StatsExtension> for Element {
    fn from(extension: StatsExtension) -> Self {
        Element::from(&extension)
    }
}

/// Parse a received `<stats/>` payload. Values arrive as text since the
/// wire form carries no type information.
impl TryFrom<Element> for StatsExtension {
    type Error = ColibriError;

    fn try_from(element: Element) -> Result<Self, Self::Error> {
        if !element.is(ELEMENT_NAME, NAMESPACE) {
            return Err(ColibriError::UnexpectedElement {
                name: element.name().to_string(),
                ns: element.ns().to_string(),
                expected_ns: NAMESPACE,
            });
        }

        let stats = element
            .children()
            .filter(|child| child.is(Stat::ELEMENT_NAME, NAMESPACE))
            .map(|child| Stat {
                name: child.attr(Stat::NAME_ATTR_NAME).map(String::from),
                value: child
                    .attr(Stat::VALUE_ATTR_NAME)
                    .map(|value| StatValue::Text(value.to_string())),
            })
            .collect();

        Ok(Self { stats })
    }
}

/// Escape text for use inside a quoted XML attribute.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn parse(xml: &str) -> Element {
        xml.parse().expect("test XML should parse")
    }

    #[test]
    fn serializes_entries_in_insertion_order() {
        let mut stats = StatsExtension::new();
        stats.add("a", "1");
        stats.add("b", 2);

        assert_eq!(
            stats.serialize(),
            "<stat name='a' value='1' /><stat name='b' value='2' />"
        );
    }

    #[test]
    fn empty_set_serializes_to_nothing() {
        let stats = StatsExtension::new();
        assert!(stats.is_empty());
        assert_eq!(stats.serialize(), "");
        assert_eq!(
            stats.to_xml(),
            "<stats xmlns='http://jitsi.org/protocol/colibri'/>"
        );
    }

    #[test]
    fn incomplete_stats_are_omitted() {
        let mut stats = StatsExtension::new();
        stats.add("before", 1);
        stats.add_stat(Stat {
            name: Some("no_value".into()),
            value: None,
        });
        stats.add_stat(Stat {
            name: None,
            value: Some(StatValue::Integer(7)),
        });
        stats.add("after", true);

        assert_eq!(stats.len(), 4);
        assert_eq!(Stat::default().to_xml(), "");
        assert_eq!(
            stats.serialize(),
            "<stat name='before' value='1' /><stat name='after' value='true' />"
        );
    }

    #[test]
    fn duplicate_names_are_kept() {
        let mut stats = StatsExtension::new();
        stats.add("rtt", 10);
        stats.add("rtt", 20);

        assert_eq!(
            stats.serialize(),
            "<stat name='rtt' value='10' /><stat name='rtt' value='20' />"
        );
        assert_eq!(stats.get("rtt"), Some(&StatValue::Integer(20)));
        assert_eq!(stats.get("missing"), None);
    }

    #[test]
    fn values_render_naturally() {
        assert_eq!(StatValue::from(-3).to_string(), "-3");
        assert_eq!(StatValue::from(0.25).to_string(), "0.25");
        assert_eq!(StatValue::from(false).to_string(), "false");
        assert_eq!(StatValue::from(u32::MAX).to_string(), "4294967295");
        assert_eq!(StatValue::from(f64::NAN).to_string(), "NaN");
        assert_eq!(StatValue::from(String::from("up")).to_string(), "up");
    }

    #[test]
    fn non_finite_floats_render_like_jvm_stats() {
        assert_eq!(StatValue::from(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(StatValue::from(f64::NEG_INFINITY).to_string(), "-Infinity");

        let stat = Stat::new("jitter", f64::INFINITY);
        assert_eq!(stat.to_xml(), "<stat name='jitter' value='Infinity' />");
    }

    #[test]
    fn unsigned_counters_convert_without_casts() {
        let bytes: u64 = 5_000_000_000;
        assert_eq!(StatValue::from(bytes), StatValue::Integer(5_000_000_000));
        assert_eq!(StatValue::from(42_usize), StatValue::Integer(42));
        assert_eq!(
            StatValue::from(u64::MAX),
            StatValue::Text("18446744073709551615".into())
        );

        let mut stats = StatsExtension::new();
        stats.add("total_bytes_received", u64::MAX);
        assert_eq!(
            stats.serialize(),
            "<stat name='total_bytes_received' value='18446744073709551615' />"
        );
    }

    #[test]
    fn escapes_attribute_metacharacters() {
        assert_eq!(
            escape_xml(r#"a&b<c>d"e'f"#),
            "a&amp;b&lt;c&gt;d&quot;e&apos;f"
        );

        let stat = Stat::new("x<y", "Tom & \"Jerry\"");
        assert_eq!(
            stat.to_xml(),
            "<stat name='x&lt;y' value='Tom &amp; &quot;Jerry&quot;' />"
        );
    }

    #[test]
    fn escaped_values_survive_a_real_parser() {
        let original = r#"<tag attr="v">&amp; it's 'quoted'"#;
        let mut stats = StatsExtension::new();
        stats.add("tricky", original);
        stats.add("n&me", 1);

        let element = parse(&stats.to_xml());
        let children: Vec<_> = element.children().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].attr("value"), Some(original));
        assert_eq!(children[1].attr("name"), Some("n&me"));
    }

    #[test]
    fn converts_to_element_without_incomplete_stats() {
        let mut stats = StatsExtension::new();
        stats.add("conferences", 3);
        stats.add_stat(Stat {
            name: Some("broken".into()),
            value: None,
        });

        let element = Element::from(&stats);
        assert!(element.is("stats", NAMESPACE));
        let children: Vec<_> = element.children().collect();
        assert_eq!(children.len(), 1);
        assert!(children[0].is("stat", NAMESPACE));
        assert_eq!(children[0].attr("name"), Some("conferences"));
        assert_eq!(children[0].attr("value"), Some("3"));
    }

    #[test]
    fn parses_received_stats_payload() {
        let element = parse(
            "<stats xmlns='http://jitsi.org/protocol/colibri'>\
             <stat name='participants' value='12' />\
             <stat name='cpu_usage' value='0.5' />\
             <stat name='partial' />\
             </stats>",
        );

        let stats = StatsExtension::try_from(element).unwrap();
        assert_eq!(stats.len(), 3);
        assert_eq!(
            stats.get("participants"),
            Some(&StatValue::Text("12".into()))
        );
        assert!(!stats.stats()[2].is_complete());
        assert_eq!(
            stats.serialize(),
            "<stat name='participants' value='12' /><stat name='cpu_usage' value='0.5' />"
        );
    }

    #[test]
    fn rejects_foreign_element() {
        let element = parse("<stats xmlns='urn:example:other'/>");
        let result = StatsExtension::try_from(element);
        assert_matches!(
            result,
            Err(ColibriError::UnexpectedElement { ref name, ref ns, .. })
                if name == "stats" && ns == "urn:example:other"
        );
    }

    #[test]
    fn serialization_does_not_mutate() {
        let mut stats = StatsExtension::new();
        stats.add("a", 1);
        let before = stats.clone();
        let _ = stats.serialize();
        let _ = stats.to_xml();
        let _ = Element::from(&stats);
        assert_eq!(stats, before);
    }
}
