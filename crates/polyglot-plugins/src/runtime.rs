//! Lua execution for plugin entry scripts
//!
//! mlua's `Lua` state is not `Send`, so every call builds a fresh state on the
//! blocking pool from the cached script source. Scripts receive an `options`
//! table:
//!
//! ```lua
//! function translate(text, from, to, options)
//!     local config = options.config
//!     local utils = options.utils
//!     options.set_result("partial...")
//!     local res = utils.http_get("https://api.example.com/?q=" .. utils.url_encode(text))
//!     return utils.json_decode(res.body).text
//! end
//! ```

use crate::PluginError;
use mlua::{Function, Lua, LuaSerdeExt, Table, Value};
use polyglot_core::{PartialSink, TranslateResult};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use tokio::runtime::Handle;
use tracing::warn;

/// Everything a call needs besides the script itself
pub(crate) struct CallEnv {
    pub config: Map<String, JsonValue>,
    pub detected: String,
    pub partial: Option<PartialSink>,
    pub http: reqwest::Client,
    pub handle: Option<Handle>,
}

/// Positional arguments before the trailing `options` table
pub(crate) enum CallArgs {
    Pair(String, String, String),
    Single(String, String),
    Collect(String, String),
}

/// Load `source` and check that it defines `function`.
pub(crate) fn verify_entry(source: &str, chunk_name: &str, function: &str) -> Result<(), PluginError> {
    let lua = Lua::new();
    setup_globals(&lua, None, reqwest::Client::new())?;
    lua.load(source).set_name(chunk_name).exec()?;

    let globals = lua.globals();
    match globals.get::<Value>(function)? {
        Value::Function(_) => Ok(()),
        _ => Err(PluginError::MissingEntryFunction {
            entry: chunk_name.to_string(),
            function: function.to_string(),
        }),
    }
}

/// Run `function` from `source` and return its result as JSON.
pub(crate) fn call_entry(
    source: &str,
    chunk_name: &str,
    function: &str,
    args: CallArgs,
    env: CallEnv,
) -> Result<JsonValue, PluginError> {
    let lua = Lua::new();
    let utils = setup_globals(&lua, env.handle.clone(), env.http.clone())?;
    lua.load(source).set_name(chunk_name).exec()?;

    let entry: Function = lua.globals().get(function).map_err(|_| {
        PluginError::MissingEntryFunction {
            entry: chunk_name.to_string(),
            function: function.to_string(),
        }
    })?;

    let options = lua.create_table()?;
    options.set("config", lua.to_value(&env.config)?)?;
    options.set("detect", env.detected.as_str())?;
    options.set("utils", utils)?;
    if let Some(sink) = env.partial {
        let set_result = lua.create_function(move |_, value: Value| {
            match serde_json::to_value(&value)
                .map_err(|e| e.to_string())
                .and_then(|json| TranslateResult::from_json(json).map_err(|e| e.to_string()))
            {
                Ok(result) => sink(result),
                Err(e) => warn!("Ignoring invalid partial result: {}", e),
            }
            Ok(())
        })?;
        options.set("set_result", set_result)?;
    } else {
        options.set("set_result", lua.create_function(|_, _: Value| Ok(()))?)?;
    }

    let result: Value = match args {
        CallArgs::Pair(text, from, to) => entry.call((text, from, to, options))?,
        CallArgs::Single(input, lang) => entry.call((input, lang, options))?,
        CallArgs::Collect(source_text, target) => entry.call((source_text, target, options))?,
    };

    serde_json::to_value(&result).map_err(|e| PluginError::InvalidResult(e.to_string()))
}

/// Install the `utils` helpers and return the table.
fn setup_globals(lua: &Lua, handle: Option<Handle>, http: reqwest::Client) -> Result<Table, PluginError> {
    let utils = lua.create_table()?;

    // utils.log(level, message)
    let log_fn = lua.create_function(|_, (level, msg): (String, String)| {
        match level.as_str() {
            "trace" => tracing::trace!(target: "polyglot::plugin", "{}", msg),
            "debug" => tracing::debug!(target: "polyglot::plugin", "{}", msg),
            "warn" => tracing::warn!(target: "polyglot::plugin", "{}", msg),
            "error" => tracing::error!(target: "polyglot::plugin", "{}", msg),
            _ => tracing::info!(target: "polyglot::plugin", "{}", msg),
        }
        Ok(())
    })?;
    utils.set("log", log_fn)?;

    let json_encode = lua.create_function(|_, value: Value| {
        serde_json::to_string(&value).map_err(mlua::Error::external)
    })?;
    utils.set("json_encode", json_encode)?;

    let json_decode = lua.create_function(|lua, s: String| {
        let json: JsonValue = serde_json::from_str(&s).map_err(mlua::Error::external)?;
        lua.to_value(&json)
    })?;
    utils.set("json_decode", json_decode)?;

    let url_encode =
        lua.create_function(|_, s: String| Ok(urlencoding::encode(&s).into_owned()))?;
    utils.set("url_encode", url_encode)?;

    // utils.http_get(url, headers?) -> { status, body }
    let get_handle = handle.clone();
    let get_client = http.clone();
    let http_get = lua.create_function(
        move |lua, (url, headers): (String, Option<HashMap<String, String>>)| {
            let request = with_headers(get_client.get(&url), headers);
            let (status, body) = block_on_request(get_handle.as_ref(), request)?;
            http_response(lua, status, body)
        },
    )?;
    utils.set("http_get", http_get)?;

    // utils.http_post(url, body, headers?) -> { status, body }
    let http_post = lua.create_function(
        move |lua, (url, body, headers): (String, String, Option<HashMap<String, String>>)| {
            let request = with_headers(http.post(&url).body(body), headers);
            let (status, body) = block_on_request(handle.as_ref(), request)?;
            http_response(lua, status, body)
        },
    )?;
    utils.set("http_post", http_post)?;

    Ok(utils)
}

fn with_headers(
    mut request: reqwest::RequestBuilder,
    headers: Option<HashMap<String, String>>,
) -> reqwest::RequestBuilder {
    for (name, value) in headers.unwrap_or_default() {
        request = request.header(name, value);
    }
    request
}

fn block_on_request(
    handle: Option<&Handle>,
    request: reqwest::RequestBuilder,
) -> mlua::Result<(u16, String)> {
    let handle = handle
        .ok_or_else(|| mlua::Error::RuntimeError("No tokio runtime available".to_string()))?;
    handle
        .block_on(async move {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        })
        .map_err(mlua::Error::external)
}

fn http_response(lua: &Lua, status: u16, body: String) -> mlua::Result<Table> {
    let response = lua.create_table()?;
    response.set("status", status)?;
    response.set("body", body)?;
    Ok(response)
}

/// Error text as the script raised it, without the Lua traceback.
pub(crate) fn script_error_message(err: &mlua::Error) -> String {
    match err {
        mlua::Error::RuntimeError(msg) => msg
            .split("\nstack traceback")
            .next()
            .unwrap_or(msg)
            .to_string(),
        mlua::Error::CallbackError { cause, .. } => script_error_message(cause),
        other => other.to_string(),
    }
}
