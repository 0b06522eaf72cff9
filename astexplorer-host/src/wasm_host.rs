//! wasmtime side of the parser module.
//!
//! A module is usable when it exports `memory`, `alloc(len) -> ptr` and the
//! entry point `(ptr, len) -> i64`, where the result packs the serialized
//! output as `(out_ptr << 32) | out_len`. `dealloc(ptr, len)` is optional and
//! so are the start routines `_initialize` / `_start`, which run once right
//! after instantiation.

use anyhow::Result;
use astexplorer_core::{InvokeError, LoadError, ParserCapability};
use std::sync::Mutex;
use wasmtime::{Engine, Instance, Linker, Memory, Module, Store, TypedFunc};

const MEMORY_EXPORT: &str = "memory";
const ALLOC_EXPORT: &str = "alloc";
const DEALLOC_EXPORT: &str = "dealloc";
const START_EXPORTS: [&str; 2] = ["_initialize", "_start"];

#[derive(Clone)]
pub struct WasmHost {
    engine: Engine,
}

impl std::fmt::Debug for WasmHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmHost").finish()
    }
}

impl WasmHost {
    pub fn new() -> Result<Self> {
        let engine = Engine::default();
        Ok(Self { engine })
    }

    /// Compile `wasm_bytes` (binary or WAT text), instantiate it in a fresh
    /// store, run its start routine, and bind `entry_point`.
    pub fn instantiate(&self, wasm_bytes: &[u8], entry_point: &str) -> Result<WasmParser, LoadError> {
        let module = Module::new(&self.engine, wasm_bytes)
            .map_err(|e| LoadError::Instantiate(format!("{:#}", e)))?;
        let mut store = Store::new(&self.engine, ());

        // The module gets no host imports.
        let linker = Linker::new(&self.engine);
        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| LoadError::Instantiate(format!("{:#}", e)))?;

        run_start(&instance, &mut store)?;

        let memory = instance
            .get_memory(&mut store, MEMORY_EXPORT)
            .ok_or_else(|| missing(MEMORY_EXPORT))?;
        let alloc = instance
            .get_typed_func::<i32, i32>(&mut store, ALLOC_EXPORT)
            .map_err(|_| missing(ALLOC_EXPORT))?;
        let entry = instance
            .get_typed_func::<(i32, i32), i64>(&mut store, entry_point)
            .map_err(|_| missing(entry_point))?;
        let dealloc = instance
            .get_typed_func::<(i32, i32), ()>(&mut store, DEALLOC_EXPORT)
            .ok();

        tracing::info!("WASM parser instantiated (entry point `{}`)", entry_point);

        Ok(WasmParser {
            entry_point: entry_point.to_string(),
            module: Mutex::new(ModuleState {
                store,
                memory,
                alloc,
                dealloc,
                entry,
            }),
        })
    }
}

fn missing(name: &str) -> LoadError {
    LoadError::MissingExport {
        name: name.to_string(),
    }
}

fn run_start(instance: &Instance, store: &mut Store<()>) -> Result<(), LoadError> {
    for name in START_EXPORTS {
        if instance.get_func(&mut *store, name).is_none() {
            continue;
        }
        let start = instance
            .get_typed_func::<(), ()>(&mut *store, name)
            .map_err(|e| LoadError::Instantiate(format!("`{}` has the wrong signature: {:#}", name, e)))?;
        start
            .call(&mut *store, ())
            .map_err(|e| LoadError::Instantiate(format!("`{}` trapped: {:#}", name, e)))?;
        tracing::debug!("Ran module start routine `{}`", name);
        break;
    }
    Ok(())
}

struct ModuleState {
    store: Store<()>,
    memory: Memory,
    alloc: TypedFunc<i32, i32>,
    dealloc: Option<TypedFunc<(i32, i32), ()>>,
    entry: TypedFunc<(i32, i32), i64>,
}

/// A live parser module. Calls are serialized through the store mutex.
pub struct WasmParser {
    entry_point: String,
    module: Mutex<ModuleState>,
}

impl std::fmt::Debug for WasmParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmParser")
            .field("entry_point", &self.entry_point)
            .finish()
    }
}

impl WasmParser {
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

/// Split the entry point's packed return value into `(ptr, len)`.
pub fn unpack(packed: i64) -> (usize, usize) {
    let bits = packed as u64;
    ((bits >> 32) as usize, (bits & 0xFFFF_FFFF) as usize)
}

fn trap(e: impl std::fmt::Display) -> InvokeError {
    InvokeError::Trap(e.to_string())
}

impl ParserCapability for WasmParser {
    fn parse_raw(&self, source: &str) -> Result<String, InvokeError> {
        let mut guard = self.module.lock().map_err(|_| InvokeError::Poisoned)?;
        let ModuleState {
            store,
            memory,
            alloc,
            dealloc,
            entry,
        } = &mut *guard;

        let input = source.as_bytes();
        let len = i32::try_from(input.len()).map_err(|_| InvokeError::SourceTooLarge(input.len()))?;

        let ptr = alloc.call(&mut *store, len).map_err(trap)?;

        let exchanged = (|| -> Result<(usize, Vec<u8>), InvokeError> {
            memory
                .write(&mut *store, ptr as u32 as usize, input)
                .map_err(|e| InvokeError::Memory(e.to_string()))?;

            let packed = entry.call(&mut *store, (ptr, len)).map_err(trap)?;
            let (out_ptr, out_len) = unpack(packed);

            let output = out_ptr
                .checked_add(out_len)
                .and_then(|end| memory.data(&*store).get(out_ptr..end))
                .ok_or_else(|| {
                    InvokeError::Memory(format!(
                        "output {:#x}+{} outside {} bytes of memory",
                        out_ptr,
                        out_len,
                        memory.data_size(&*store)
                    ))
                })?
                .to_vec();
            Ok((out_ptr, output))
        })();

        // The input block is released whether or not the call succeeded.
        if let Some(dealloc) = dealloc.as_ref() {
            dealloc.call(&mut *store, (ptr, len)).map_err(trap)?;
        }
        let (out_ptr, output) = exchanged?;

        if let Some(dealloc) = dealloc.as_ref() {
            // Some parsers answer in place; never free the same block twice.
            if out_ptr != ptr as u32 as usize && !output.is_empty() {
                dealloc
                    .call(&mut *store, (out_ptr as u32 as i32, output.len() as u32 as i32))
                    .map_err(trap)?;
            }
        }

        String::from_utf8(output).map_err(|_| InvokeError::InvalidUtf8)
    }
}
