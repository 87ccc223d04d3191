//! Common test utilities and an in-memory search engine.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use regmgr_core::{Error, Result};
use regmgr_es::{Body, Method, Request, Response, SearchEngine};
use serde_json::{Map, Value, json};

/// One index held by the [`FakeEngine`].
#[derive(Debug, Clone, Default)]
pub struct FakeIndex {
    /// Field → type.
    pub mapping: BTreeMap<String, String>,
    /// `_id` → source.
    pub docs: BTreeMap<String, Value>,
    /// Create-index body as received.
    pub settings: Value,
}

/// In-memory engine covering the endpoints the registry manager uses.
#[derive(Default)]
pub struct FakeEngine {
    indices: Mutex<BTreeMap<String, FakeIndex>>,
    requests: Mutex<Vec<Request>>,
    reject_ids: Mutex<HashSet<String>>,
    fail_bulk: Mutex<usize>,
}

impl FakeEngine {
    /// Empty engine.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Engine with an index that already has `mapping`.
    pub fn with_index(name: &str, mapping: &[(&str, &str)]) -> Arc<Self> {
        let engine = Self::default();
        engine.indices.lock().unwrap().insert(
            name.to_string(),
            FakeIndex {
                mapping: mapping
                    .iter()
                    .map(|(f, t)| (f.to_string(), t.to_string()))
                    .collect(),
                ..Default::default()
            },
        );
        Arc::new(engine)
    }

    /// Add registry records directly, bypassing request logging.
    pub fn seed_registry(&self, index: &str, entries: &[(&str, &str)]) {
        let mut indices = self.indices.lock().unwrap();
        let idx = indices.entry(index.to_string()).or_default();
        for (id, data_type) in entries {
            idx.docs.insert(
                id.to_string(),
                json!({"es_field_name": id, "es_data_type": data_type}),
            );
        }
    }

    /// Make the bulk endpoint reject documents with this id.
    pub fn reject_id(&self, id: &str) {
        self.reject_ids.lock().unwrap().insert(id.to_string());
    }

    /// Fail the next `n` bulk requests at the transport level.
    pub fn fail_next_bulk(&self, n: usize) {
        *self.fail_bulk.lock().unwrap() = n;
    }

    /// Snapshot of an index.
    pub fn index(&self, name: &str) -> Option<FakeIndex> {
        self.indices.lock().unwrap().get(name).cloned()
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose path contains `fragment`.
    pub fn requests_to(&self, fragment: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.contains(fragment))
            .collect()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn handle(&self, request: &Request) -> Result<Response> {
        let (path, _query) = request
            .path
            .split_once('?')
            .unwrap_or((request.path.as_str(), ""));
        let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        match (request.method, parts.as_slice()) {
            (Method::Put, [index]) => self.create_index(index, request),
            (Method::Get, [index, "_mapping"]) => self.get_mapping(index, &request.path),
            (Method::Put, [index, "_mapping"]) => self.put_mapping(index, request),
            (Method::Put, [index, "_doc", id]) => self.put_doc(index, id, request),
            (Method::Get, [index, "_mget"]) => self.mget(index, request),
            (Method::Post, [index, "_bulk"]) => self.bulk(index, request),
            (Method::Post, [index, "_search"]) => self.search(index, request),
            _ => Err(Error::engine(400, &request.path, "Unsupported request")),
        }
    }

    fn create_index(&self, index: &str, request: &Request) -> Result<Response> {
        let mut indices = self.indices.lock().unwrap();
        if indices.contains_key(index) {
            return Err(Error::engine(
                400,
                &request.path,
                format!("index [{index}/fake-uuid] already exists"),
            ));
        }
        let body = request.json().cloned().unwrap_or(Value::Null);
        let mapping = body
            .pointer("/mappings/properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .filter_map(|(k, v)| {
                        v.get("type")
                            .and_then(Value::as_str)
                            .map(|t| (k.clone(), t.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        indices.insert(
            index.to_string(),
            FakeIndex {
                mapping,
                docs: BTreeMap::new(),
                settings: body,
            },
        );
        Ok(Response::json(json!({"acknowledged": true, "index": index})))
    }

    fn get_mapping(&self, index: &str, path: &str) -> Result<Response> {
        let indices = self.indices.lock().unwrap();
        let idx = indices
            .get(index)
            .ok_or_else(|| Error::engine(404, path, format!("no such index [{index}]")))?;
        let properties: Map<String, Value> = idx
            .mapping
            .iter()
            .map(|(f, t)| (f.clone(), json!({"type": t})))
            .collect();
        Ok(Response::json(
            json!({ index: {"mappings": {"properties": properties}} }),
        ))
    }

    fn put_mapping(&self, index: &str, request: &Request) -> Result<Response> {
        let mut indices = self.indices.lock().unwrap();
        let idx = indices
            .get_mut(index)
            .ok_or_else(|| Error::engine(404, &request.path, format!("no such index [{index}]")))?;
        let properties = request
            .json()
            .and_then(|b| b.get("properties"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for (field, def) in properties {
            let data_type = def.get("type").and_then(Value::as_str).unwrap_or("object");
            if let Some(existing) = idx.mapping.get(&field)
                && existing != data_type
            {
                return Err(Error::engine(
                    400,
                    &request.path,
                    format!("mapper [{field}] cannot be changed from type [{existing}] to [{data_type}]"),
                ));
            }
            idx.mapping.insert(field, data_type.to_string());
        }
        Ok(Response::json(json!({"acknowledged": true})))
    }

    fn put_doc(&self, index: &str, id: &str, request: &Request) -> Result<Response> {
        let id = urlencoding::decode(id).unwrap().into_owned();
        let mut indices = self.indices.lock().unwrap();
        let idx = indices.entry(index.to_string()).or_default();
        idx.docs
            .insert(id.clone(), request.json().cloned().unwrap_or(Value::Null));
        Ok(Response::json(json!({"_id": id, "result": "updated"})))
    }

    fn mget(&self, index: &str, request: &Request) -> Result<Response> {
        let indices = self.indices.lock().unwrap();
        let idx = indices.get(index).cloned().unwrap_or_default();
        let ids = request
            .json()
            .and_then(|b| b.get("ids"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let docs: Vec<Value> = ids
            .iter()
            .filter_map(Value::as_str)
            .map(|id| match idx.docs.get(id) {
                Some(source) => json!({
                    "_id": id,
                    "found": true,
                    "_source": {"es_data_type": source["es_data_type"]}
                }),
                None => json!({"_id": id, "found": false}),
            })
            .collect();
        Ok(Response::json(json!({ "docs": docs })))
    }

    fn bulk(&self, index: &str, request: &Request) -> Result<Response> {
        {
            let mut remaining = self.fail_bulk.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::transport("connection reset by peer"));
            }
        }

        let Some(Body::NdJson(body)) = &request.body else {
            return Err(Error::engine(400, &request.path, "Bulk body must be NDJSON"));
        };
        let reject = self.reject_ids.lock().unwrap().clone();
        let mut indices = self.indices.lock().unwrap();
        let idx = indices.entry(index.to_string()).or_default();

        let lines: Vec<Value> = body
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        let mut items = Vec::new();
        let mut errors = false;
        for pair in lines.chunks(2) {
            let id = pair[0]["index"]["_id"].as_str().unwrap().to_string();
            if reject.contains(&id) {
                errors = true;
                items.push(json!({"index": {"_id": id, "status": 400,
                    "error": {"type": "mapper_parsing_exception", "reason": format!("failed to parse document {id}")}}}));
            } else {
                idx.docs.insert(id.clone(), pair[1].clone());
                items.push(json!({"index": {"_id": id, "status": 201}}));
            }
        }
        Ok(Response::json(json!({"errors": errors, "items": items})))
    }

    fn search(&self, index: &str, request: &Request) -> Result<Response> {
        let indices = self.indices.lock().unwrap();
        let idx = indices.get(index).cloned().unwrap_or_default();
        let body = request.json().cloned().unwrap_or(Value::Null);
        let size = body["size"].as_u64().unwrap_or(10) as usize;
        let after = body["search_after"][0].as_str().map(String::from);

        let hits: Vec<Value> = idx
            .docs
            .keys()
            .filter(|id| after.as_ref().is_none_or(|a| id.as_str() > a.as_str()))
            .take(size)
            .map(|id| json!({"_id": id, "sort": [id]}))
            .collect();
        Ok(Response::json(json!({"hits": {"hits": hits}})))
    }
}

#[async_trait]
impl SearchEngine for FakeEngine {
    async fn request(&self, request: Request) -> Result<Response> {
        self.requests.lock().unwrap().push(request.clone());
        self.handle(&request)
    }
}

/// A data dictionary with the given `(identifier, dataType)` attributes.
pub fn dictionary_json(version: &str, attributes: &[(&str, &str)]) -> String {
    let attrs: Vec<Value> = attributes
        .iter()
        .map(|(id, data_type)| json!({"attribute": {"identifier": id, "dataType": data_type}}))
        .collect();
    json!([{"dataDictionary": {
        "Version": version,
        "Date": "2021-03-01",
        "attributeDictionary": attrs
    }}])
    .to_string()
}
