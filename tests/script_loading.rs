use rendergraph_script::{BlendMode, ScriptContents, ScriptEngine, ScriptException};

fn load(source: &str) -> ScriptContents {
    ScriptEngine::new().load_script(source).unwrap()
}

fn load_err(source: &str) -> ScriptException {
    ScriptEngine::new().load_script(source).unwrap_err()
}

#[test]
fn minimal_script_loads_and_runs_empty() {
    let mut engine = ScriptEngine::new();
    let contents = engine
        .load_script(
            "[declaration:\"X\"]\nfloat X(){{return 1.0;}}\n[rendergraph]\nvoid Main(){{GetSwapchainImage();}}",
        )
        .unwrap();

    assert_eq!(contents.shader_descs.len(), 1);
    let desc = &contents.shader_descs[0];
    assert_eq!(desc.name, "X");
    assert!(desc.uniforms.is_empty());
    assert!(desc.samplers.is_empty());
    assert!(desc.outs.is_empty());
    assert!(contents.declarations.is_empty());

    // GetSwapchainImage records nothing and Main never invokes a pass.
    let events = engine.run_script(&[]).unwrap();
    assert!(events.context_requests.is_empty());
    assert!(events.shader_invocations.is_empty());
}

#[test]
fn pass_arguments_are_classified_into_slots() {
    let contents = load("vec4 Tonemap(in vec4 color, out vec4 result){{}}");
    let desc = &contents.shader_descs[0];
    assert_eq!(desc.uniforms.len(), 1);
    assert_eq!(desc.uniforms[0].name, "color");
    assert_eq!(desc.uniforms[0].ty, "vec4");
    assert_eq!(desc.outs.len(), 1);
    assert_eq!(desc.outs[0].name, "result");
    assert!(desc.samplers.is_empty());
}

#[test]
fn named_fragments_are_listed_as_declarations() {
    let contents = load(
        "[declaration: \"noise\"]\n{{float noise(vec2 p) { return 0.0; }\n}}\n\
         [declaration: \"Blit\"]\nvec4 Blit(out vec4 target){{}}",
    );
    // A named pass block is a shader desc, not a declaration.
    assert_eq!(contents.declarations.len(), 1);
    assert_eq!(contents.declarations[0].name, "noise");
    assert_eq!(contents.declarations[0].body.start, 2);
    assert_eq!(contents.shader_descs.len(), 1);
    assert_eq!(contents.shader_descs[0].name, "Blit");
}

#[test]
fn shader_desc_includes_keep_closure_order_and_duplicates() {
    let contents = load(
        "[declaration: \"A\"]{{a}}\n\
         [declaration: \"B\"][include: \"A\"]{{b}}\n\
         [include: \"A\", \"B\"]\nvec4 Compose(out vec4 target){{}}",
    );
    let desc = &contents.shader_descs[0];
    assert_eq!(desc.name, "Compose");
    assert_eq!(desc.includes, ["A", "A", "B"]);
}

#[test]
fn blend_mode_defaults_to_opaque() {
    let contents = load(
        "vec4 A(out vec4 t){{}}\n[blendmode: multiplicative]\nvec4 B(out vec4 t){{}}",
    );
    assert_eq!(contents.shader_descs[0].blend_mode, BlendMode::Opaque);
    assert_eq!(contents.shader_descs[1].blend_mode, BlendMode::Multiplicative);
}

#[test]
fn undeclared_include_fails_at_body_start_line() {
    let err = load_err("[declaration: \"A\"]{{a}}\n[include: \"Missing\"]\n{{b}}");
    assert_eq!(err.line, 3);
    assert_eq!(err.description, "included block 'Missing' does not exist");
}

#[test]
fn bogus_preamble_section_is_a_syntax_error() {
    let err = load_err("[bogus]\n{{}}");
    assert_eq!((err.line, err.column), (1, 2));
    assert!(err.description.contains("bogus"), "{err:?}");
}

#[test]
fn unterminated_block_reports_the_opening_braces() {
    let err = load_err("void Main(){{ never closed");
    assert_eq!((err.line, err.column), (1, 12));
    assert!(err.description.contains("unterminated"), "{err:?}");
}

#[test]
fn include_cycle_hits_the_recursion_limit() {
    let err = load_err("[declaration: \"A\"][include: \"A\"]{{a}}");
    assert!(err.description.contains("too deep"), "{err:?}");
}

#[test]
fn parse_failure_keeps_the_previous_script_loaded() {
    let mut engine = ScriptEngine::new();
    engine
        .load_script("[rendergraph]\nvoid Main(){{Text(\"alive\");}}")
        .unwrap();

    // Syntax errors abort before any runtime work, so the old script stays.
    assert!(engine.load_script("[bogus]{{}}").is_err());
    let events = engine.run_script(&[]).unwrap();
    assert_eq!(events.context_requests.len(), 1);
}

#[test]
fn build_failure_leaves_the_engine_unloaded() {
    let mut engine = ScriptEngine::new();
    engine
        .load_script("[rendergraph]\nvoid Main(){{Text(\"alive\");}}")
        .unwrap();

    assert!(engine.load_script("[rendergraph]\nvoid Main(){{const = 1;}}").is_err());
    let err = engine.run_script(&[]).unwrap_err();
    assert_eq!(err.description, "no script loaded");
}

#[test]
fn build_error_line_is_remapped_to_the_script() {
    let err = load_err("[rendergraph]\nvoid Main(){{\nconst = 1;\n}}");
    assert_eq!(err.line, 3, "{err:?}");
}
