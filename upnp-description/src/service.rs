//! Service control protocol descriptions (SCPD)
//!
//! The document behind a service's `SCPDURL`: the actions it accepts and its
//! state variable table.

use std::io::BufRead;

use url::Url;

use crate::collection::{DescriptionDictionary, DescriptionList, KeyedDescription};
use crate::error::{DescriptionError, Result};
use crate::node::{Description, DescriptionNode, NoChildren};
use crate::reader::{DescriptionReader, Token};
use crate::root::SpecVersion;

/// Structured children of an `<scpd>` element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceChild {
    SpecVersion,
    ActionList,
    ServiceStateTable,
}

/// A parsed SCPD document
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDescription {
    node: DescriptionNode,
    spec_version: SpecVersion,
    actions: DescriptionDictionary<ActionDescription>,
    state_variables: DescriptionDictionary<StateVariableDescription>,
    document_url: Option<Url>,
}

impl ServiceDescription {
    pub fn from_reader<R: BufRead>(source: R, document_url: Option<Url>) -> Result<Self> {
        let mut reader = DescriptionReader::new(source);
        reader.move_to_content()?;
        let mut service = Self::read_from(&mut reader)?;
        service.document_url = document_url;
        Ok(service)
    }

    pub fn from_str(xml: &str, document_url: Option<Url>) -> Result<Self> {
        Self::from_reader(xml.as_bytes(), document_url)
    }

    pub fn spec_version(&self) -> &SpecVersion {
        &self.spec_version
    }

    /// Actions keyed by name, in document order
    pub fn actions(&self) -> &DescriptionDictionary<ActionDescription> {
        &self.actions
    }

    /// State variables keyed by name, in document order
    pub fn state_variables(&self) -> &DescriptionDictionary<StateVariableDescription> {
        &self.state_variables
    }

    pub fn action(&self, name: &str) -> Option<&ActionDescription> {
        self.actions.get(name)
    }

    pub fn state_variable(&self, name: &str) -> Option<&StateVariableDescription> {
        self.state_variables.get(name)
    }

    /// Absolute URL the document was fetched from
    pub fn document_url(&self) -> Option<&Url> {
        self.document_url.as_ref()
    }

    /// State variable an argument is typed by
    pub fn related_state_variable(&self, argument: &ArgumentDescription) -> Option<&StateVariableDescription> {
        self.state_variable(argument.related_state_variable())
    }

    /// State variables the service sends change events for
    pub fn evented_variables(&self) -> impl Iterator<Item = &StateVariableDescription> {
        self.state_variables.values().filter(|variable| variable.send_events())
    }
}

impl Description for ServiceDescription {
    const ELEMENT: &'static str = "scpd";
    const PROPERTIES: &'static [&'static str] = &["@configId"];
    type Child = ServiceChild;

    fn empty() -> Self {
        Self {
            node: DescriptionNode::new(),
            spec_version: SpecVersion::default(),
            actions: DescriptionDictionary::new("actionList"),
            state_variables: DescriptionDictionary::new("serviceStateTable"),
            document_url: None,
        }
    }

    fn node(&self) -> &DescriptionNode {
        &self.node
    }

    fn node_mut(&mut self) -> &mut DescriptionNode {
        &mut self.node
    }

    fn recognize(name: &str) -> Option<ServiceChild> {
        match name {
            "specVersion" => Some(ServiceChild::SpecVersion),
            "actionList" => Some(ServiceChild::ActionList),
            "serviceStateTable" => Some(ServiceChild::ServiceStateTable),
            _ => None,
        }
    }

    fn read_child<R: BufRead>(&mut self, child: ServiceChild, reader: &mut DescriptionReader<R>) -> Result<()> {
        match child {
            ServiceChild::SpecVersion => self.spec_version.append_from(reader),
            ServiceChild::ActionList => self.actions.add_items_from(reader),
            ServiceChild::ServiceStateTable => self.state_variables.add_items_from(reader),
        }
    }
}

/// Direction of an action argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentDirection {
    In,
    Out,
}

/// An `<action>` of an SCPD `actionList`
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDescription {
    node: DescriptionNode,
    arguments: DescriptionList<ArgumentDescription>,
}

impl ActionDescription {
    pub fn name(&self) -> &str {
        self.node.get_string("name", "").trim()
    }

    /// All arguments in declaration order
    pub fn arguments(&self) -> &DescriptionList<ArgumentDescription> {
        &self.arguments
    }

    pub fn input_arguments(&self) -> impl Iterator<Item = &ArgumentDescription> {
        self.arguments
            .iter()
            .filter(|argument| argument.direction() == ArgumentDirection::In)
    }

    pub fn output_arguments(&self) -> impl Iterator<Item = &ArgumentDescription> {
        self.arguments
            .iter()
            .filter(|argument| argument.direction() == ArgumentDirection::Out)
    }
}

impl Description for ActionDescription {
    const ELEMENT: &'static str = "action";
    const PROPERTIES: &'static [&'static str] = &["name"];
    type Child = ActionChild;

    fn empty() -> Self {
        Self {
            node: DescriptionNode::new(),
            arguments: DescriptionList::new("argumentList"),
        }
    }

    fn node(&self) -> &DescriptionNode {
        &self.node
    }

    fn node_mut(&mut self) -> &mut DescriptionNode {
        &mut self.node
    }

    fn recognize(name: &str) -> Option<ActionChild> {
        (name == "argumentList").then_some(ActionChild::ArgumentList)
    }

    fn read_child<R: BufRead>(&mut self, child: ActionChild, reader: &mut DescriptionReader<R>) -> Result<()> {
        match child {
            ActionChild::ArgumentList => self.arguments.add_items_from(reader),
        }
    }
}

impl KeyedDescription for ActionDescription {
    fn key(&self) -> &str {
        self.name()
    }
}

/// Structured children of an `<action>` element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionChild {
    ArgumentList,
}

/// An `<argument>` of an action
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgumentDescription {
    node: DescriptionNode,
}

impl ArgumentDescription {
    pub fn name(&self) -> &str {
        self.node.get_string("name", "").trim()
    }

    /// `out` when the document says so (case-insensitively), `in` otherwise
    pub fn direction(&self) -> ArgumentDirection {
        if self.node.get_string("direction", "in").trim().eq_ignore_ascii_case("out") {
            ArgumentDirection::Out
        } else {
            ArgumentDirection::In
        }
    }

    pub fn related_state_variable(&self) -> &str {
        self.node.get_string("relatedStateVariable", "").trim()
    }

    /// True when the argument carries a `<retval/>` marker
    pub fn is_return_value(&self) -> bool {
        self.node.has_property("retval")
    }
}

impl Description for ArgumentDescription {
    const ELEMENT: &'static str = "argument";
    const PROPERTIES: &'static [&'static str] = &["name", "direction", "relatedStateVariable", "retval"];
    type Child = NoChildren;

    fn empty() -> Self {
        Self::default()
    }

    fn node(&self) -> &DescriptionNode {
        &self.node
    }

    fn node_mut(&mut self) -> &mut DescriptionNode {
        &mut self.node
    }

    fn recognize(_name: &str) -> Option<NoChildren> {
        None
    }

    fn read_child<R: BufRead>(&mut self, child: NoChildren, _: &mut DescriptionReader<R>) -> Result<()> {
        match child {}
    }
}

/// Structured children of a `<stateVariable>` element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateVariableChild {
    AllowedValueList,
    AllowedValueRange,
}

/// A `<stateVariable>` of an SCPD `serviceStateTable`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateVariableDescription {
    node: DescriptionNode,
    allowed_values: Vec<String>,
    allowed_range: Option<AllowedValueRange>,
}

impl StateVariableDescription {
    pub fn name(&self) -> &str {
        self.node.get_string("name", "").trim()
    }

    /// UPnP data type such as `ui4`, `string` or `boolean`
    pub fn data_type(&self) -> &str {
        self.node.get_string("dataType", "string").trim()
    }

    pub fn default_value(&self) -> Option<&str> {
        self.node.property("defaultValue")
    }

    /// `sendEvents` attribute; variables are evented unless it says `no`
    pub fn send_events(&self) -> bool {
        !self.node.get_string("@sendEvents", "yes").trim().eq_ignore_ascii_case("no")
    }

    pub fn multicast(&self) -> bool {
        self.node.get_string("@multicast", "no").trim().eq_ignore_ascii_case("yes")
    }

    /// Values listed in `allowedValueList`, in document order
    pub fn allowed_values(&self) -> &[String] {
        &self.allowed_values
    }

    pub fn allowed_range(&self) -> Option<&AllowedValueRange> {
        self.allowed_range.as_ref()
    }

    /// `allowedValueList` repeats one element name, which a property bag
    /// would collapse, so its values are collected in document order.
    fn read_allowed_values<R: BufRead>(&mut self, reader: &mut DescriptionReader<R>) -> Result<()> {
        let (_, self_closing) = reader.expect_start("allowedValueList")?;
        self.allowed_values.clear();
        if self_closing {
            return Ok(());
        }
        loop {
            match reader.advance()? {
                Token::Start { name, .. } if name == "allowedValue" => {
                    let value = read_allowed_value(reader)?;
                    self.allowed_values.push(value);
                }
                Token::Empty { name, .. } if name == "allowedValue" => self.allowed_values.push(String::new()),
                Token::Start { .. } => reader.skip_element()?,
                Token::End { name } if name == "allowedValueList" => return Ok(()),
                Token::End { name } => {
                    return Err(DescriptionError::structure("</allowedValueList>", format!("</{}>", name)))
                }
                Token::Eof | Token::Begin => {
                    return Err(DescriptionError::structure("</allowedValueList>", "end of document"))
                }
                Token::Empty { .. } | Token::Text(_) => {}
            }
        }
    }
}

impl Description for StateVariableDescription {
    const ELEMENT: &'static str = "stateVariable";
    const PROPERTIES: &'static [&'static str] =
        &["name", "dataType", "defaultValue", "@sendEvents", "@multicast"];
    type Child = StateVariableChild;

    fn empty() -> Self {
        Self::default()
    }

    fn node(&self) -> &DescriptionNode {
        &self.node
    }

    fn node_mut(&mut self) -> &mut DescriptionNode {
        &mut self.node
    }

    fn recognize(name: &str) -> Option<StateVariableChild> {
        match name {
            "allowedValueList" => Some(StateVariableChild::AllowedValueList),
            "allowedValueRange" => Some(StateVariableChild::AllowedValueRange),
            _ => None,
        }
    }

    fn read_child<R: BufRead>(
        &mut self,
        child: StateVariableChild,
        reader: &mut DescriptionReader<R>,
    ) -> Result<()> {
        match child {
            StateVariableChild::AllowedValueList => self.read_allowed_values(reader),
            StateVariableChild::AllowedValueRange => {
                self.allowed_range = Some(AllowedValueRange::read_from(reader)?);
                Ok(())
            }
        }
    }
}

impl KeyedDescription for StateVariableDescription {
    fn key(&self) -> &str {
        self.name()
    }
}

/// Text of an `<allowedValue>`; nested markup is skipped
fn read_allowed_value<R: BufRead>(reader: &mut DescriptionReader<R>) -> Result<String> {
    let mut value = String::new();
    loop {
        match reader.advance()? {
            Token::Text(text) => value.push_str(&text),
            Token::End { name } if name == "allowedValue" => return Ok(value),
            Token::End { name } => {
                return Err(DescriptionError::structure("</allowedValue>", format!("</{}>", name)))
            }
            Token::Start { .. } => reader.skip_element()?,
            Token::Empty { .. } => {}
            Token::Eof | Token::Begin => {
                return Err(DescriptionError::structure("</allowedValue>", "end of document"))
            }
        }
    }
}

/// `<allowedValueRange>` of a numeric state variable
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AllowedValueRange {
    node: DescriptionNode,
}

impl AllowedValueRange {
    pub fn minimum(&self) -> Option<f64> {
        self.node.property("minimum").and_then(|v| v.trim().parse().ok())
    }

    pub fn maximum(&self) -> Option<f64> {
        self.node.property("maximum").and_then(|v| v.trim().parse().ok())
    }

    /// Step between allowed values, 1 when the document omits it
    pub fn step(&self) -> f64 {
        self.node.get_double("step", 1.0)
    }

    /// Whether `value` lies within the declared bounds
    pub fn contains(&self, value: f64) -> bool {
        self.minimum().map_or(true, |min| value >= min) && self.maximum().map_or(true, |max| value <= max)
    }
}

impl Description for AllowedValueRange {
    const ELEMENT: &'static str = "allowedValueRange";
    const PROPERTIES: &'static [&'static str] = &["minimum", "maximum", "step"];
    type Child = NoChildren;

    fn empty() -> Self {
        Self::default()
    }

    fn node(&self) -> &DescriptionNode {
        &self.node
    }

    fn node_mut(&mut self) -> &mut DescriptionNode {
        &mut self.node
    }

    fn recognize(_name: &str) -> Option<NoChildren> {
        None
    }

    fn read_child<R: BufRead>(&mut self, child: NoChildren, _: &mut DescriptionReader<R>) -> Result<()> {
        match child {}
    }
}
