//! Editor session state and command execution
//!
//! One connection owns one [`InstanceState`]. Operations execute on a clone
//! of the state and are committed only on success, so cancellation and
//! failure roll back to the pre-operation snapshot by construction.

use crate::error::{EditorError, EditorResult};
use crate::protocol::{ChunkFrame, Command, EditorResponse, OutboundFrame};
use arsenal_core::{ArsenalError, Configuration, Output, ProviderError};
use arsenal_llm::{CancelFlag, InferenceOptions, ParserRegistry, StreamCallback};
use arsenal_runtime::Runtime;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

// ============================================================================
// INSTANCE STATE
// ============================================================================

/// One editor client's bound instance of a configuration.
#[derive(Clone)]
pub struct InstanceState {
    pub instance_id: Uuid,
    pub runtime: Runtime,
    pub path: Option<PathBuf>,
}

impl InstanceState {
    /// Initialize a session instance.
    ///
    /// When a path is given and the file exists, the configuration is loaded
    /// from it; otherwise a fresh document is created (and saved to the path
    /// when one is bound).
    pub fn initialize(
        config_path: Option<&Path>,
        registry: Arc<ParserRegistry>,
    ) -> EditorResult<Self> {
        let runtime = match config_path {
            Some(path) if path.exists() => Runtime::load_with_registry(path, registry)?,
            Some(path) => {
                let mut runtime = Runtime::from_config_with_registry(
                    Configuration::new("untitled"),
                    registry,
                );
                runtime.save(Some(path), true)?;
                runtime
            }
            None => Runtime::from_config_with_registry(Configuration::new("untitled"), registry),
        };

        Ok(Self {
            instance_id: Uuid::now_v7(),
            runtime,
            path: config_path.map(Path::to_path_buf),
        })
    }

    /// The instance id as a string, as carried by protocol frames.
    pub fn id(&self) -> String {
        self.instance_id.to_string()
    }

    /// The serialized configuration for response envelopes.
    pub fn aiconfig_json(&self) -> Value {
        self.runtime
            .config()
            .to_json(true)
            .unwrap_or(Value::Null)
    }
}

impl std::fmt::Debug for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceState")
            .field("instance_id", &self.instance_id)
            .field("path", &self.path)
            .finish()
    }
}

// ============================================================================
// OPERATION EXECUTION
// ============================================================================

/// Execute one operation against a snapshot of the session state.
///
/// Returns the state to commit (`None` keeps the pre-operation snapshot)
/// and the terminal response. Streaming runs push chunk frames through
/// `out` before the terminal response is emitted by the session loop.
pub async fn execute_operation(
    command: Command,
    mut state: InstanceState,
    out: mpsc::UnboundedSender<OutboundFrame>,
    cancel: CancelFlag,
) -> (Option<InstanceState>, EditorResponse) {
    let id = state.id();

    match command {
        Command::GetInstanceStatus => (
            Some(state),
            EditorResponse::ok(id, "OK").with_data(json!({"status": "OK"})),
        ),

        Command::ListModels => match state.runtime.registry().ids() {
            Ok(ids) => (
                Some(state),
                EditorResponse::ok(id, "Registered parser ids").with_data(json!({"ids": ids})),
            ),
            Err(e) => (None, EditorResponse::fail(id, e.to_string())),
        },

        Command::LoadModelParserModule { path } => {
            match load_parser_manifest(&path, state.runtime.registry()) {
                Ok(count) => (
                    Some(state),
                    EditorResponse::ok(id, format!("Registered {} parser bindings", count)),
                ),
                Err(e) => (None, EditorResponse::fail(id, e.to_string())),
            }
        }

        Command::Create => {
            let registry = Arc::clone(state.runtime.registry());
            state.runtime =
                Runtime::from_config_with_registry(Configuration::new("untitled"), registry);
            let aiconfig = state.aiconfig_json();
            (
                Some(state),
                EditorResponse::ok(id, "Created new configuration").with_aiconfig(aiconfig),
            )
        }

        Command::Load { path: Some(path) } => {
            let registry = Arc::clone(state.runtime.registry());
            match Runtime::load_with_registry(&path, registry) {
                Ok(runtime) => {
                    state.runtime = runtime;
                    state.path = Some(path.clone());
                    let aiconfig = state.aiconfig_json();
                    (
                        Some(state),
                        EditorResponse::ok(id, format!("Loaded {}", path.display()))
                            .with_aiconfig(aiconfig),
                    )
                }
                Err(e) => (None, EditorResponse::fail(id, format!("Load failed: {}", e))),
            }
        }

        Command::Load { path: None } => {
            let aiconfig = state.aiconfig_json();
            (
                Some(state),
                EditorResponse::ok(id, "Current configuration").with_aiconfig(aiconfig),
            )
        }

        Command::Save { path } => match state.runtime.save(Some(&path), true) {
            Ok(written) => {
                state.path = Some(written.clone());
                (
                    Some(state),
                    EditorResponse::ok(id, format!("Saved to {}", written.display())),
                )
            }
            Err(e) => (None, EditorResponse::fail(id, format!("Save failed: {}", e))),
        },

        Command::Run {
            prompt_name,
            params,
            stream,
        } => {
            let options = InferenceOptions {
                stream,
                stream_callback: if stream {
                    Some(chunk_forwarder(out.clone()))
                } else {
                    None
                },
                cancel,
                api_token: None,
            };

            match state.runtime.run(&prompt_name, &params, &options, false).await {
                Ok(outputs) => {
                    let aiconfig = state.aiconfig_json();
                    (
                        Some(state),
                        EditorResponse::ok(id, format!("Ran prompt {}", prompt_name))
                            .with_data(json!({ "outputs": outputs }))
                            .with_aiconfig(aiconfig),
                    )
                }
                Err(ArsenalError::Provider(e)) => {
                    // The failure is recorded on the prompt so partial
                    // success across multi-prompt execution stays visible.
                    let output = Output::error(provider_error_name(&e), e.to_string());
                    let _ = state
                        .runtime
                        .config_mut()
                        .add_output(&prompt_name, output, false);
                    (
                        Some(state),
                        EditorResponse::fail(id, format!("Run failed: {}", e)),
                    )
                }
                Err(e) => (None, EditorResponse::fail(id, format!("Run failed: {}", e))),
            }
        }

        Command::AddPrompt {
            prompt_name,
            mut prompt_data,
            index,
        } => {
            prompt_data.name = prompt_name.clone();
            mutate(state, |config| config.add_prompt(prompt_data, index).map(|_| ()))
                .into_response(format!("Added prompt {}", prompt_name))
        }

        Command::UpdatePrompt {
            prompt_name,
            prompt_data,
        } => mutate(state, |config| {
            config.update_prompt(&prompt_name, prompt_data).map(|_| ())
        })
        .into_response("Updated prompt"),

        Command::DeletePrompt { prompt_name } => {
            mutate(state, |config| config.delete_prompt(&prompt_name).map(|_| ()))
                .into_response("Deleted prompt")
        }

        Command::UpdateModel {
            model_name,
            settings,
            prompt_name,
        } => mutate(state, |config| {
            config.update_model(&model_name, settings, prompt_name.as_deref())
        })
        .into_response(format!("Updated model {}", model_name)),

        Command::SetParameter {
            parameter_name,
            parameter_value,
            prompt_name,
        } => mutate(state, |config| {
            config.set_parameter(&parameter_name, parameter_value, prompt_name.as_deref())
        })
        .into_response(format!("Set parameter {}", parameter_name)),

        Command::SetParameters {
            parameters,
            prompt_name,
        } => mutate(state, |config| {
            config.set_parameters(parameters, prompt_name.as_deref())
        })
        .into_response("Set parameters"),

        Command::DeleteParameter {
            parameter_name,
            prompt_name,
        } => mutate(state, |config| {
            config.delete_parameter(&parameter_name, prompt_name.as_deref())
        })
        .into_response(format!("Deleted parameter {}", parameter_name)),

        Command::SetName { name } => mutate(state, |config| {
            config.set_name(name);
            Ok(())
        })
        .into_response("Set name"),

        Command::SetDescription { description } => mutate(state, |config| {
            config.set_description(description);
            Ok(())
        })
        .into_response("Set description"),

        // Cancel is handled out-of-band by the session loop.
        Command::Cancel => (
            Some(state),
            EditorResponse::ok(id, "No operation in progress; nothing to cancel"),
        ),
    }
}

/// Forward accumulated streaming output as chunk frames.
fn chunk_forwarder(out: mpsc::UnboundedSender<OutboundFrame>) -> StreamCallback {
    Arc::new(move |_delta, accumulated, index| {
        let frame = OutboundFrame::Chunk(ChunkFrame {
            output_chunk: json!({
                "output_type": "execute_result",
                "execution_count": index,
                "data": accumulated,
            }),
        });
        let _ = out.send(frame);
    })
}

/// Outcome of a configuration mutation.
struct MutationOutcome {
    state: InstanceState,
    result: Result<(), ArsenalError>,
}

impl MutationOutcome {
    fn into_response(self, message: impl Into<String>) -> (Option<InstanceState>, EditorResponse) {
        let id = self.state.id();
        match self.result {
            Ok(()) => {
                let aiconfig = self.state.aiconfig_json();
                (
                    Some(self.state),
                    EditorResponse::ok(id, message).with_aiconfig(aiconfig),
                )
            }
            Err(e) => (None, EditorResponse::fail(id, e.to_string())),
        }
    }
}

/// Apply one mutation to the snapshot's configuration.
fn mutate(
    mut state: InstanceState,
    f: impl FnOnce(&mut Configuration) -> Result<(), ArsenalError>,
) -> MutationOutcome {
    let result = f(state.runtime.config_mut());
    MutationOutcome { state, result }
}

/// Protocol error name for a provider failure.
fn provider_error_name(error: &ProviderError) -> &'static str {
    match error {
        ProviderError::MissingCredential { .. } => "MissingCredentialError",
        ProviderError::RemoteCall { .. } => "RemoteCallError",
        ProviderError::Decoding { .. } => "DecodingError",
        ProviderError::UnsupportedInput { .. } => "UnsupportedInputError",
    }
}

/// Load a parser alias manifest: a TOML table of `model_id = "parser_id"`
/// bindings applied to the registry.
fn load_parser_manifest(path: &Path, registry: &Arc<ParserRegistry>) -> EditorResult<usize> {
    let contents = std::fs::read_to_string(path)?;
    let manifest: BTreeMap<String, String> =
        toml::from_str(&contents).map_err(|e| EditorError::Manifest {
            reason: format!("{}: {}", path.display(), e),
        })?;

    for (model_id, parser_id) in &manifest {
        let parser = registry.get(parser_id).map_err(|_| EditorError::Manifest {
            reason: format!("unknown parser id: {}", parser_id),
        })?;
        registry
            .register(parser, Some(&[model_id.as_str()]))
            .map_err(EditorError::Core)?;
    }
    Ok(manifest.len())
}

// ============================================================================
// TESTS
// ============================================================================
