/// Placeholder replaced with the number of models the pipeline is built for.
pub const MODEL_COUNT_TOKEN: &str = "{{MODEL_COUNT}}";
/// Placeholder replaced with the array bound (the model count, at least 1).
pub const MODEL_ARRAY_LEN_TOKEN: &str = "{{MODEL_ARRAY_LEN}}";
/// Placeholder replaced with the object-space sphere radius.
pub const SPHERE_RADIUS_TOKEN: &str = "{{SPHERE_RADIUS}}";

/// Full-screen ray-march of a smooth union of spheres with an environment
/// reflection. Instantiate with [`raymarch_source`].
pub const RAYMARCH_TEMPLATE: &str = r#"
const MODEL_COUNT: u32 = {{MODEL_COUNT}}u;
const SPHERE_RADIUS: f32 = {{SPHERE_RADIUS}};
const SHAPE_SPHERE: i32 = 0;

const MAX_STEPS: i32 = 96;
const MAX_DIST: f32 = 20.0;
const HIT_EPSILON: f32 = 0.001;
const BLEND: f32 = 0.25;

struct Camera {
    position: vec3<f32>,
    projection_inverse: mat4x4<f32>,
    view_inverse: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
};

struct Model {
    shape: i32,
    inverse_world: mat4x4<f32>,
};

struct Models {
    items: array<Model, {{MODEL_ARRAY_LEN}}>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(0) @binding(1) var<uniform> models: Models;
@group(0) @binding(2) var env_map: texture_cube<f32>;
@group(0) @binding(3) var env_sampler: sampler;

struct ScreenOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
};

// One triangle covering the whole viewport.
@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> ScreenOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    let ndc = uv * 2.0 - 1.0;
    var out: ScreenOutput;
    out.clip_position = vec4<f32>(ndc, 0.0, 1.0);
    out.ndc = ndc;
    return out;
}

fn smooth_min(a: f32, b: f32, k: f32) -> f32 {
    let h = clamp(0.5 + 0.5 * (b - a) / k, 0.0, 1.0);
    return mix(b, a, h) - k * h * (1.0 - h);
}

fn shape_distance(shape: i32, p: vec3<f32>) -> f32 {
    var d = MAX_DIST;
    if shape == SHAPE_SPHERE {
        d = length(p) - SPHERE_RADIUS;
    }
    return d;
}

fn scene_distance(p: vec3<f32>) -> f32 {
    var d = MAX_DIST;
    for (var i = 0u; i < MODEL_COUNT; i = i + 1u) {
        let model = models.items[i];
        let local = (model.inverse_world * vec4<f32>(p, 1.0)).xyz;
        d = smooth_min(d, shape_distance(model.shape, local), BLEND);
    }
    return d;
}

fn scene_normal(p: vec3<f32>) -> vec3<f32> {
    let e = vec2<f32>(0.0005, 0.0);
    return normalize(vec3<f32>(
        scene_distance(p + e.xyy) - scene_distance(p - e.xyy),
        scene_distance(p + e.yxy) - scene_distance(p - e.yxy),
        scene_distance(p + e.yyx) - scene_distance(p - e.yyx),
    ));
}

@fragment
fn fs_main(in: ScreenOutput) -> @location(0) vec4<f32> {
    let far_view = camera.projection_inverse * vec4<f32>(in.ndc, 1.0, 1.0);
    let dir_view = normalize(far_view.xyz / far_view.w);
    let dir = normalize((camera.view_inverse * vec4<f32>(dir_view, 0.0)).xyz);
    let origin = camera.position;

    var t = 0.0;
    var hit = false;
    for (var iteration = 0; iteration < MAX_STEPS; iteration = iteration + 1) {
        let d = scene_distance(origin + dir * t);
        if d < HIT_EPSILON {
            hit = true;
            break;
        }
        t = t + d;
        if t > MAX_DIST {
            break;
        }
    }
    if !hit {
        return vec4<f32>(0.0);
    }

    let p = origin + dir * t;
    let n = scene_normal(p);
    let view_normal = normalize((camera.normal_matrix * vec4<f32>(n, 0.0)).xyz);
    let reflected = reflect(dir, n);
    let env = textureSampleLevel(env_map, env_sampler, reflected, 0.0).rgb;
    let fresnel = pow(1.0 - clamp(abs(view_normal.z), 0.0, 1.0), 3.0);
    let color = mix(env * 0.85, vec3<f32>(1.0), fresnel * 0.6);
    return vec4<f32>(color, 1.0);
}
"#;

/// Instanced wire spheres for the debug view.
pub const DEBUG_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct InstanceInput {
    @location(1) model_0: vec4<f32>,
    @location(2) model_1: vec4<f32>,
    @location(3) model_2: vec4<f32>,
    @location(4) model_3: vec4<f32>,
    @location(5) color: vec4<f32>,
};

struct DebugOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_debug(@location(0) position: vec3<f32>, instance: InstanceInput) -> DebugOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    var out: DebugOutput;
    out.clip_position = uniforms.view_proj * model * vec4<f32>(position, 1.0);
    out.color = instance.color;
    return out;
}

@fragment
fn fs_debug(in: DebugOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// Instantiate a ray-march template for a fixed model count.
///
/// `template` is usually [`RAYMARCH_TEMPLATE`]; a user-supplied override
/// must use the same placeholders and bindings.
pub fn raymarch_source(template: &str, model_count: usize, sphere_radius: f32) -> String {
    template
        .replace(MODEL_COUNT_TOKEN, &model_count.to_string())
        .replace(MODEL_ARRAY_LEN_TOKEN, &model_count.max(1).to_string())
        .replace(SPHERE_RADIUS_TOKEN, &format!("{sphere_radius:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(source: &str) {
        let module = naga::front::wgsl::parse_str(source).unwrap_or_else(|e| {
            panic!("{}", e.emit_to_string(source));
        });
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap();
    }

    #[test]
    fn raymarch_shader_validates() {
        validate(&raymarch_source(RAYMARCH_TEMPLATE, 20, 0.1));
    }

    #[test]
    fn raymarch_shader_validates_with_no_models() {
        validate(&raymarch_source(RAYMARCH_TEMPLATE, 0, 0.1));
    }

    #[test]
    fn debug_shader_validates() {
        validate(DEBUG_SHADER);
    }

    #[test]
    fn model_count_is_baked_in() {
        let source = raymarch_source(RAYMARCH_TEMPLATE, 7, 0.25);
        assert!(source.contains("const MODEL_COUNT: u32 = 7u;"));
        assert!(source.contains("array<Model, 7>"));
        assert!(source.contains("const SPHERE_RADIUS: f32 = 0.25;"));
        assert!(!source.contains("{{"));
    }

    #[test]
    fn whole_radius_keeps_float_literal() {
        let source = raymarch_source(RAYMARCH_TEMPLATE, 1, 1.0);
        assert!(source.contains("const SPHERE_RADIUS: f32 = 1.0;"));
    }

    #[test]
    fn empty_scene_keeps_one_array_slot() {
        let source = raymarch_source(RAYMARCH_TEMPLATE, 0, 0.1);
        assert!(source.contains("const MODEL_COUNT: u32 = 0u;"));
        assert!(source.contains("array<Model, 1>"));
    }
}
