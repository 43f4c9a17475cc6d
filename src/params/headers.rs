//! Adds fixed request headers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::HeaderValues;
use crate::http::{RequestArgs, RequestContext};
use crate::params::{ParamError, ParamMod};

/// Appends its headers to every outgoing request.
#[derive(Debug, Clone)]
pub struct HeadersParam {
    headers: HeaderMap,
}

impl HeadersParam {
    /// Parse configured names and values. Every value of a name is kept, in
    /// order. Fails on the first invalid name or value.
    pub fn from_pairs(pairs: &BTreeMap<String, HeaderValues>) -> Result<Self, ParamError> {
        let mut headers = HeaderMap::with_capacity(pairs.len());
        for (name, values) in pairs {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ParamError::InvalidHeaderName(name.clone()))?;
            for value in values.iter() {
                let header_value =
                    HeaderValue::from_str(value).map_err(|_| ParamError::InvalidHeaderValue(name.clone()))?;
                headers.append(header_name.clone(), header_value);
            }
        }
        Ok(Self { headers })
    }
}

#[async_trait]
impl ParamMod for HeadersParam {
    fn name(&self) -> &'static str {
        "headers"
    }

    fn on_request(&mut self, req: &mut RequestArgs, _ctx: &RequestContext) -> Result<(), ParamError> {
        for (name, value) in self.headers.iter() {
            req.headers.append(name.clone(), value.clone());
        }
        Ok(())
    }
}
