use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use ua_core::{
    AttributeService, MethodCallback, MethodService, NodeManagementService, ServiceError,
    UserRole, ViewService,
};
use ua_proto::{
    AttributeId, DataValue, LocalizedText, NodeClass, NodeId, QualifiedName, StatusCode, Variant,
    attribute::{access_level, object_ids},
    services::{
        AddNodesItem, AddNodesResult, AddReferencesItem, BrowseDescription, BrowseDirection,
        BrowsePath, BrowsePathResult, BrowsePathTarget, BrowseResult, CallMethodRequest,
        CallMethodResult, DeleteNodesItem, DeleteReferencesItem, ReferenceDescription,
        WriteParameters,
    },
};

/// Namespace for nodes added without a requested id.
const GENERATED_NAMESPACE: u16 = 1;

/// Called after every successful attribute write, outside the store lock.
pub type WriteObserver = Arc<dyn Fn(&NodeId, AttributeId, &DataValue) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Reference {
    reference_type: NodeId,
    target: NodeId,
    is_forward: bool,
}

impl Reference {
    /// Exact match on the reference type; `None` matches every type.
    fn has_type(&self, filter: Option<&NodeId>) -> bool {
        filter.is_none_or(|t| *t == self.reference_type)
    }
}

#[derive(Debug, Clone)]
struct NodeRecord {
    class: NodeClass,
    attributes: BTreeMap<AttributeId, DataValue>,
    references: Vec<Reference>,
}

impl NodeRecord {
    fn browse_name(&self) -> QualifiedName {
        match self.attributes.get(&AttributeId::BrowseName).map(|v| &v.value) {
            Some(Variant::String(name)) => QualifiedName::new(0, name.clone()),
            _ => QualifiedName::default(),
        }
    }

    fn display_name(&self) -> LocalizedText {
        match self.attributes.get(&AttributeId::DisplayName).map(|v| &v.value) {
            Some(Variant::LocalizedText(text)) => text.clone(),
            _ => LocalizedText::default(),
        }
    }
}

#[derive(Default)]
struct AddressSpaceInner {
    nodes: HashMap<NodeId, NodeRecord>,
    methods: HashMap<NodeId, MethodCallback>,
    observers: Vec<WriteObserver>,
    next_generated_id: u32,
}

impl AddressSpaceInner {
    fn link(&mut self, source: &NodeId, reference_type: &NodeId, target: &NodeId) {
        if let Some(node) = self.nodes.get_mut(source) {
            node.references.push(Reference {
                reference_type: reference_type.clone(),
                target: target.clone(),
                is_forward: true,
            });
        }
        if let Some(node) = self.nodes.get_mut(target) {
            node.references.push(Reference {
                reference_type: reference_type.clone(),
                target: source.clone(),
                is_forward: false,
            });
        }
    }

    fn add(&mut self, item: &AddNodesItem) -> AddNodesResult {
        if !self.nodes.contains_key(&item.parent_node_id) {
            return AddNodesResult {
                status_code: StatusCode::BAD_PARENT_NODE_ID_INVALID,
                ..AddNodesResult::default()
            };
        }

        let node_id = if item.requested_new_node_id.is_null() {
            self.generate_id()
        } else {
            item.requested_new_node_id.clone()
        };
        if self.nodes.contains_key(&node_id) {
            return AddNodesResult {
                status_code: StatusCode::BAD_NODE_ID_EXISTS,
                ..AddNodesResult::default()
            };
        }

        let mut attributes = BTreeMap::new();
        attributes
            .insert(AttributeId::BrowseName, DataValue::new(item.browse_name.name.clone()));
        attributes.insert(AttributeId::DisplayName, DataValue::new(item.display_name.clone()));
        match item.node_class {
            NodeClass::Variable => {
                let value = item.value.clone().unwrap_or_default();
                attributes.insert(AttributeId::Value, DataValue::new(value));
                for level in [AttributeId::AccessLevel, AttributeId::UserAccessLevel] {
                    attributes.insert(level, DataValue::new(access_level::CURRENT_READ));
                }
                attributes.insert(AttributeId::Historizing, DataValue::new(false));
            },
            NodeClass::Object => {
                attributes.insert(AttributeId::EventNotifier, DataValue::new(0u8));
            },
            _ => {},
        }

        self.nodes.insert(node_id.clone(), NodeRecord {
            class: item.node_class,
            attributes,
            references: Vec::new(),
        });
        self.link(&item.parent_node_id, &item.reference_type_id, &node_id);
        if let Some(type_definition) = &item.type_definition {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.references.push(Reference {
                    reference_type: NodeId::from(object_ids::HAS_TYPE_DEFINITION),
                    target: type_definition.clone(),
                    is_forward: true,
                });
            }
        }

        AddNodesResult { status_code: StatusCode::GOOD, added_node_id: node_id }
    }

    fn generate_id(&mut self) -> NodeId {
        loop {
            self.next_generated_id += 1;
            let candidate = NodeId::numeric(GENERATED_NAMESPACE, self.next_generated_id);
            if !self.nodes.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn read(&self, node_id: &NodeId, attribute: AttributeId) -> DataValue {
        let Some(node) = self.nodes.get(node_id) else {
            return DataValue::bad(StatusCode::BAD_NODE_ID_UNKNOWN);
        };
        match attribute {
            AttributeId::NodeId => DataValue::new(node_id.clone()),
            AttributeId::NodeClass => DataValue::new(node.class as u32),
            other => node
                .attributes
                .get(&other)
                .cloned()
                .unwrap_or_else(|| DataValue::bad(StatusCode::BAD_ATTRIBUTE_ID_INVALID)),
        }
    }

    fn write(
        &mut self,
        node_id: &NodeId,
        attribute: AttributeId,
        value: DataValue,
        user: UserRole,
    ) -> StatusCode {
        let Some(node) = self.nodes.get_mut(node_id) else {
            return StatusCode::BAD_NODE_ID_UNKNOWN;
        };
        if matches!(attribute, AttributeId::NodeId | AttributeId::NodeClass) {
            return StatusCode::BAD_NOT_WRITABLE;
        }
        if user != UserRole::Admin {
            if attribute != AttributeId::Value {
                return StatusCode::BAD_USER_ACCESS_DENIED;
            }
            let writable = [AttributeId::AccessLevel, AttributeId::UserAccessLevel]
                .iter()
                .all(|level| {
                    node.attributes
                        .get(level)
                        .and_then(|v| v.value.as_u32())
                        .is_some_and(|bits| bits & u32::from(access_level::CURRENT_WRITE) != 0)
                });
            if !writable {
                return StatusCode::BAD_USER_ACCESS_DENIED;
            }
        }

        match node.attributes.get_mut(&attribute) {
            Some(slot) => {
                *slot = value;
                StatusCode::GOOD
            },
            None => StatusCode::BAD_ATTRIBUTE_ID_INVALID,
        }
    }
}

/// In-memory address space.
///
/// Starts with the standard nodes the server core writes to: the Objects
/// folder, the Server object, its namespace array and server status
/// variables. Implements attribute, view, node-management and method
/// services. Reference types are matched exactly; subtype hierarchies are
/// not modelled.
#[derive(Clone)]
pub struct MemoryAddressSpace {
    inner: Arc<Mutex<AddressSpaceInner>>,
}

impl Default for MemoryAddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAddressSpace {
    /// Address space holding the standard server nodes.
    pub fn new() -> Self {
        let space = Self { inner: Arc::new(Mutex::new(AddressSpaceInner::default())) };

        {
            let mut inner = space.lock();
            let objects = NodeId::from(object_ids::OBJECTS_FOLDER);
            let mut attributes = BTreeMap::new();
            attributes.insert(AttributeId::BrowseName, DataValue::new("Objects"));
            attributes
                .insert(AttributeId::DisplayName, DataValue::new(LocalizedText::new("Objects")));
            attributes.insert(AttributeId::EventNotifier, DataValue::new(0u8));
            inner.nodes.insert(objects, NodeRecord {
                class: NodeClass::Object,
                attributes,
                references: Vec::new(),
            });
        }

        let organizes = NodeId::from(object_ids::ORGANIZES);
        let component = NodeId::from(object_ids::HAS_COMPONENT);
        let property = NodeId::from(object_ids::HAS_PROPERTY);
        let objects = NodeId::from(object_ids::OBJECTS_FOLDER);
        let server = NodeId::from(object_ids::SERVER);
        let status = NodeId::from(object_ids::SERVER_SERVER_STATUS);

        let standard = [
            (object_ids::SERVER, "Server", &objects, &organizes, NodeClass::Object),
            (
                object_ids::SERVER_NAMESPACE_ARRAY,
                "NamespaceArray",
                &server,
                &property,
                NodeClass::Variable,
            ),
            (
                object_ids::SERVER_SERVER_STATUS,
                "ServerStatus",
                &server,
                &component,
                NodeClass::Variable,
            ),
            (
                object_ids::SERVER_SERVER_STATUS_START_TIME,
                "StartTime",
                &status,
                &component,
                NodeClass::Variable,
            ),
            (
                object_ids::SERVER_SERVER_STATUS_CURRENT_TIME,
                "CurrentTime",
                &status,
                &component,
                NodeClass::Variable,
            ),
            (
                object_ids::SERVER_SERVER_STATUS_STATE,
                "State",
                &status,
                &component,
                NodeClass::Variable,
            ),
        ];
        for (id, name, parent, reference_type, class) in standard {
            let result = space.lock().add(&AddNodesItem {
                parent_node_id: parent.clone(),
                reference_type_id: reference_type.clone(),
                requested_new_node_id: NodeId::from(id),
                browse_name: QualifiedName::new(0, name),
                node_class: class,
                display_name: LocalizedText::new(name),
                value: None,
                type_definition: None,
            });
            debug_assert!(result.status_code.is_good(), "standard node {name}");
        }

        space
    }

    /// Add an object under `parent`, organized by it. Returns the status of
    /// the add.
    pub fn add_object(&self, node_id: NodeId, name: &str, parent: &NodeId) -> StatusCode {
        self.lock()
            .add(&AddNodesItem {
                parent_node_id: parent.clone(),
                reference_type_id: NodeId::from(object_ids::ORGANIZES),
                requested_new_node_id: node_id,
                browse_name: QualifiedName::new(0, name),
                node_class: NodeClass::Object,
                display_name: LocalizedText::new(name),
                value: None,
                type_definition: Some(NodeId::from(object_ids::FOLDER_TYPE)),
            })
            .status_code
    }

    /// Add a variable component of `parent` holding `value`. Returns the
    /// status of the add.
    pub fn add_variable(
        &self,
        node_id: NodeId,
        name: &str,
        parent: &NodeId,
        value: impl Into<Variant>,
    ) -> StatusCode {
        self.lock()
            .add(&AddNodesItem {
                parent_node_id: parent.clone(),
                reference_type_id: NodeId::from(object_ids::HAS_COMPONENT),
                requested_new_node_id: node_id,
                browse_name: QualifiedName::new(0, name),
                node_class: NodeClass::Variable,
                display_name: LocalizedText::new(name),
                value: Some(value.into()),
                type_definition: Some(NodeId::from(object_ids::BASE_DATA_VARIABLE_TYPE)),
            })
            .status_code
    }

    /// Whether `node_id` exists.
    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.lock().nodes.contains_key(node_id)
    }

    /// Current value of one attribute, bypassing sessions.
    pub fn attribute(&self, node_id: &NodeId, attribute: AttributeId) -> DataValue {
        self.lock().read(node_id, attribute)
    }

    /// Register a callback run after each successful write.
    pub fn add_write_observer(&self, observer: WriteObserver) {
        self.lock().observers.push(observer);
    }

    fn lock(&self) -> MutexGuard<'_, AddressSpaceInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AttributeService for MemoryAddressSpace {
    fn read(
        &self,
        params: &ua_proto::services::ReadParameters,
    ) -> Result<Vec<DataValue>, ServiceError> {
        let inner = self.lock();
        Ok(params.nodes_to_read.iter().map(|r| inner.read(&r.node_id, r.attribute_id)).collect())
    }

    fn write(
        &self,
        params: WriteParameters,
        user: UserRole,
    ) -> Result<Vec<StatusCode>, ServiceError> {
        let mut written = Vec::new();
        let (statuses, observers) = {
            let mut inner = self.lock();
            let statuses = params
                .nodes_to_write
                .into_iter()
                .map(|w| {
                    let status = inner.write(&w.node_id, w.attribute_id, w.value.clone(), user);
                    if status.is_good() {
                        written.push((w.node_id, w.attribute_id, w.value));
                    }
                    status
                })
                .collect::<Vec<_>>();
            (statuses, inner.observers.clone())
        };

        for (node_id, attribute, value) in &written {
            for observer in &observers {
                observer(node_id, *attribute, value);
            }
        }
        Ok(statuses)
    }
}

impl ViewService for MemoryAddressSpace {
    fn browse(&self, nodes: &[BrowseDescription]) -> Result<Vec<BrowseResult>, ServiceError> {
        let inner = self.lock();

        Ok(nodes
            .iter()
            .map(|description| {
                let Some(node) = inner.nodes.get(&description.node_id) else {
                    return BrowseResult {
                        status_code: StatusCode::BAD_NODE_ID_UNKNOWN,
                        references: Vec::new(),
                    };
                };

                let references = node
                    .references
                    .iter()
                    .filter(|r| match description.browse_direction {
                        BrowseDirection::Forward => r.is_forward,
                        BrowseDirection::Inverse => !r.is_forward,
                        BrowseDirection::Both => true,
                    })
                    .filter(|r| r.has_type(description.reference_type_id.as_ref()))
                    .map(|r| {
                        let target = inner.nodes.get(&r.target);
                        ReferenceDescription {
                            reference_type_id: r.reference_type.clone(),
                            is_forward: r.is_forward,
                            node_id: r.target.clone(),
                            browse_name: target.map(NodeRecord::browse_name).unwrap_or_default(),
                            display_name: target.map(NodeRecord::display_name).unwrap_or_default(),
                            node_class: target.map(|t| t.class).unwrap_or_default(),
                        }
                    })
                    .collect();

                BrowseResult { status_code: StatusCode::GOOD, references }
            })
            .collect())
    }

    fn translate_browse_paths_to_node_ids(
        &self,
        paths: &[BrowsePath],
    ) -> Result<Vec<BrowsePathResult>, ServiceError> {
        let inner = self.lock();

        Ok(paths
            .iter()
            .map(|path| {
                if !inner.nodes.contains_key(&path.starting_node) {
                    return BrowsePathResult {
                        status_code: StatusCode::BAD_NODE_ID_UNKNOWN,
                        targets: Vec::new(),
                    };
                }

                let mut current = vec![path.starting_node.clone()];
                for element in &path.relative_path {
                    current = current
                        .iter()
                        .filter_map(|id| inner.nodes.get(id))
                        .flat_map(|node| node.references.iter())
                        .filter(|r| r.is_forward != element.is_inverse)
                        .filter(|r| r.has_type(element.reference_type_id.as_ref()))
                        .filter(|r| {
                            inner.nodes.get(&r.target).is_some_and(|t| {
                                t.browse_name().name == element.target_name.name
                            })
                        })
                        .map(|r| r.target.clone())
                        .collect();
                }

                if current.is_empty() {
                    BrowsePathResult { status_code: StatusCode::BAD_NO_MATCH, targets: Vec::new() }
                } else {
                    let targets = current
                        .into_iter()
                        .map(|target_id| BrowsePathTarget {
                            target_id,
                            remaining_path_index: u32::MAX,
                        })
                        .collect();
                    BrowsePathResult { status_code: StatusCode::GOOD, targets }
                }
            })
            .collect())
    }
}

impl NodeManagementService for MemoryAddressSpace {
    fn add_nodes(
        &self,
        items: &[AddNodesItem],
        user: UserRole,
    ) -> Result<Vec<AddNodesResult>, ServiceError> {
        let mut inner = self.lock();
        Ok(items
            .iter()
            .map(|item| {
                if user == UserRole::Admin {
                    inner.add(item)
                } else {
                    AddNodesResult {
                        status_code: StatusCode::BAD_USER_ACCESS_DENIED,
                        ..AddNodesResult::default()
                    }
                }
            })
            .collect())
    }

    fn delete_nodes(
        &self,
        items: &[DeleteNodesItem],
        user: UserRole,
    ) -> Result<Vec<StatusCode>, ServiceError> {
        let mut inner = self.lock();
        Ok(items
            .iter()
            .map(|item| {
                if user != UserRole::Admin {
                    return StatusCode::BAD_USER_ACCESS_DENIED;
                }
                if inner.nodes.remove(&item.node_id).is_none() {
                    return StatusCode::BAD_NODE_ID_UNKNOWN;
                }
                inner.methods.remove(&item.node_id);
                if item.delete_target_references {
                    for node in inner.nodes.values_mut() {
                        node.references.retain(|r| r.target != item.node_id);
                    }
                }
                StatusCode::GOOD
            })
            .collect())
    }

    fn add_references(
        &self,
        items: &[AddReferencesItem],
        user: UserRole,
    ) -> Result<Vec<StatusCode>, ServiceError> {
        let mut inner = self.lock();
        Ok(items
            .iter()
            .map(|item| {
                if user != UserRole::Admin {
                    return StatusCode::BAD_USER_ACCESS_DENIED;
                }
                if !inner.nodes.contains_key(&item.source_node_id) {
                    return StatusCode::BAD_SOURCE_NODE_ID_INVALID;
                }
                if !inner.nodes.contains_key(&item.target_node_id) {
                    return StatusCode::BAD_TARGET_NODE_ID_INVALID;
                }
                if item.is_forward {
                    inner.link(&item.source_node_id, &item.reference_type_id, &item.target_node_id);
                } else {
                    inner.link(&item.target_node_id, &item.reference_type_id, &item.source_node_id);
                }
                StatusCode::GOOD
            })
            .collect())
    }

    fn delete_references(
        &self,
        items: &[DeleteReferencesItem],
        user: UserRole,
    ) -> Result<Vec<StatusCode>, ServiceError> {
        let mut inner = self.lock();
        Ok(items
            .iter()
            .map(|item| {
                if user != UserRole::Admin {
                    return StatusCode::BAD_USER_ACCESS_DENIED;
                }
                let Some(source) = inner.nodes.get_mut(&item.source_node_id) else {
                    return StatusCode::BAD_SOURCE_NODE_ID_INVALID;
                };
                let wanted = Reference {
                    reference_type: item.reference_type_id.clone(),
                    target: item.target_node_id.clone(),
                    is_forward: item.is_forward,
                };
                let before = source.references.len();
                source.references.retain(|r| *r != wanted);
                if source.references.len() == before {
                    return StatusCode::BAD_NOTHING_TO_DO;
                }

                if item.delete_bidirectional {
                    if let Some(target) = inner.nodes.get_mut(&item.target_node_id) {
                        let inverse = Reference {
                            reference_type: item.reference_type_id.clone(),
                            target: item.source_node_id.clone(),
                            is_forward: !item.is_forward,
                        };
                        target.references.retain(|r| *r != inverse);
                    }
                }
                StatusCode::GOOD
            })
            .collect())
    }
}

impl MethodService for MemoryAddressSpace {
    fn call(&self, requests: &[CallMethodRequest]) -> Result<Vec<CallMethodResult>, ServiceError> {
        Ok(requests
            .iter()
            .map(|request| {
                // Run the callback without holding the store lock; it may
                // read or write the address space itself.
                let callback = self.lock().methods.get(&request.method_id).cloned();
                let Some(callback) = callback else {
                    return CallMethodResult {
                        status_code: StatusCode::BAD_METHOD_INVALID,
                        ..CallMethodResult::default()
                    };
                };

                match callback(&request.object_id, &request.input_arguments) {
                    Ok(output_arguments) => CallMethodResult {
                        status_code: StatusCode::GOOD,
                        input_argument_results: vec![
                            StatusCode::GOOD;
                            request.input_arguments.len()
                        ],
                        output_arguments,
                    },
                    Err(status_code) => {
                        CallMethodResult { status_code, ..CallMethodResult::default() }
                    },
                }
            })
            .collect())
    }

    fn add_method_callback(&self, method_id: NodeId, callback: MethodCallback) {
        self.lock().methods.insert(method_id, callback);
    }
}
