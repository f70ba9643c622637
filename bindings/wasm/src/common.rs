use anyhow::{anyhow, Result};
use js_sys::{Array, Function, Reflect};
use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::{JsCast, JsValue};

pub(crate) fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e:#}"))
}

/// Plain JS objects (not `Map`s) so MapLibre can read the specs.
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).map_err(|e| anyhow!("Failed to convert to JS: {e}"))
}

pub(crate) fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T> {
    serde_wasm_bindgen::from_value(value).map_err(|e| anyhow!("Failed to convert from JS: {e}"))
}

/// `target[method](...args)`, with exceptions turned into errors.
pub(crate) fn call(target: &JsValue, method: &str, args: &[JsValue]) -> Result<JsValue> {
    let func: Function = Reflect::get(target, &JsValue::from_str(method))
        .map_err(|e| anyhow!("error getting method '{method}': {e:?}"))?
        .dyn_into()
        .map_err(|_| anyhow!("'{method}' is not a function"))?;
    let args: Array = args.iter().collect();
    func.apply(target, &args).map_err(|e| anyhow!("{method} failed: {e:?}"))
}
