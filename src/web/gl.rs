//! WebGL2 backend for the stitch trail
//!
//! One shader program draws everything as `LINES`: each marker owns a
//! 4-vertex cross buffer (rotation baked in), the trail shares one dynamic
//! line buffer rebuilt every frame.

use glam::{Mat4, Quat, Vec3};
use tracing::{debug, info};
use wasm_bindgen::JsCast;
use web_sys::{
    WebGl2RenderingContext as GL, WebGlBuffer, WebGlContextAttributes, WebGlProgram, WebGlShader,
    WebGlUniformLocation,
};

use super::js_err;
use super::overlay::Overlay;
use crate::core::{LineVertex, RenderBackend, SceneFrame, TrailError, TrailResult};
use crate::theme::colors;

const A_POSITION: u32 = 0;
const A_COLOR: u32 = 1;
const FLOATS_PER_VERTEX: i32 = 6;
const STRIDE: i32 = FLOATS_PER_VERTEX * 4;

/// GPU resources of one marker cross
pub struct GlMarker {
    buffer: WebGlBuffer,
}

pub struct WebGlBackend {
    gl: GL,
    overlay: Overlay,
    program: WebGlProgram,
    line_buffer: WebGlBuffer,
    u_view_proj: WebGlUniformLocation,
    u_model: WebGlUniformLocation,
    u_opacity: WebGlUniformLocation,
    max_pixel_ratio: f64,
    disposed: bool,
}

impl WebGlBackend {
    /// Create a WebGL2 context on the overlay canvas. Dropping the overlay on
    /// failure removes the canvas again.
    pub fn new(overlay: Overlay, max_pixel_ratio: f64) -> TrailResult<Self> {
        let attrs = WebGlContextAttributes::new();
        attrs.set_alpha(true);
        attrs.set_antialias(true);
        attrs.set_premultiplied_alpha(true);

        let gl: GL = overlay
            .canvas()
            .get_context_with_context_options("webgl2", &attrs)
            .map_err(js_err)?
            .ok_or_else(|| TrailError::Unsupported("WebGL2 not available".into()))?
            .dyn_into()
            .map_err(|_| TrailError::Unsupported("context is not WebGL2".into()))?;

        let program = link_program(&gl, include_str!("stitch.vert"), include_str!("stitch.frag"))?;
        let uniform = |name: &str| {
            gl.get_uniform_location(&program, name)
                .ok_or_else(|| TrailError::Resource(format!("missing uniform {}", name)))
        };
        let u_view_proj = uniform("u_view_proj")?;
        let u_model = uniform("u_model")?;
        let u_opacity = uniform("u_opacity")?;

        let line_buffer = gl
            .create_buffer()
            .ok_or_else(|| TrailError::Resource("line buffer".into()))?;

        let [r, g, b, a] = colors::CLEAR_RGBA;
        gl.clear_color(r, g, b, a);
        gl.enable(GL::BLEND);
        gl.blend_func(GL::ONE, GL::ONE_MINUS_SRC_ALPHA);

        info!("WebGL2 backend ready");
        Ok(Self {
            gl,
            overlay,
            program,
            line_buffer,
            u_view_proj,
            u_model,
            u_opacity,
            max_pixel_ratio,
            disposed: false,
        })
    }

    fn bind_vertices(&self, buffer: &WebGlBuffer) {
        self.gl.bind_buffer(GL::ARRAY_BUFFER, Some(buffer));
        self.gl.enable_vertex_attrib_array(A_POSITION);
        self.gl
            .vertex_attrib_pointer_with_i32(A_POSITION, 3, GL::FLOAT, false, STRIDE, 0);
        self.gl.enable_vertex_attrib_array(A_COLOR);
        self.gl
            .vertex_attrib_pointer_with_i32(A_COLOR, 3, GL::FLOAT, false, STRIDE, 12);
    }

    fn upload(&self, usage: u32, vertices: &[LineVertex]) {
        let data = js_sys::Float32Array::from(bytemuck::cast_slice::<LineVertex, f32>(vertices));
        self.gl
            .buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &data, usage);
    }
}

/// Cross vertices in marker-local space, rotated about z.
fn cross_vertices(rotation: f32, half_size: f32) -> [LineVertex; 4] {
    let rot = Quat::from_rotation_z(rotation);
    let corner = |x: f32, y: f32| LineVertex::new(rot * Vec3::new(x, y, 0.0) * half_size, colors::STITCH_RGB);
    [
        corner(-1.0, 1.0),
        corner(1.0, -1.0),
        corner(1.0, 1.0),
        corner(-1.0, -1.0),
    ]
}

impl RenderBackend for WebGlBackend {
    type Marker = GlMarker;

    fn create_marker(&mut self, _position: Vec3, rotation: f32, half_size: f32) -> TrailResult<GlMarker> {
        let buffer = self
            .gl
            .create_buffer()
            .ok_or_else(|| TrailError::Resource("marker buffer".into()))?;
        self.gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
        self.upload(GL::STATIC_DRAW, &cross_vertices(rotation, half_size));
        Ok(GlMarker { buffer })
    }

    fn release_marker(&mut self, marker: GlMarker) {
        self.gl.delete_buffer(Some(&marker.buffer));
    }

    fn resize(&mut self, width: u32, height: u32) -> TrailResult<()> {
        let ratio = web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or(1.0)
            .min(self.max_pixel_ratio);
        let pixel_width = (width as f64 * ratio).round() as u32;
        let pixel_height = (height as f64 * ratio).round() as u32;
        self.overlay.set_pixel_size(pixel_width, pixel_height);
        self.gl.viewport(0, 0, pixel_width as i32, pixel_height as i32);
        debug!(pixel_width, pixel_height, ratio, "Surface resized");
        Ok(())
    }

    fn set_scroll_offset(&mut self, offset: f64) {
        self.overlay.set_scroll_offset(offset);
    }

    fn draw(&mut self, frame: &SceneFrame<'_, GlMarker>) -> TrailResult<()> {
        if self.gl.is_context_lost() {
            return Err(TrailError::ContextLost);
        }

        self.gl.clear(GL::COLOR_BUFFER_BIT);
        self.gl.use_program(Some(&self.program));
        self.gl.uniform_matrix4fv_with_f32_array(
            Some(&self.u_view_proj),
            false,
            &frame.view_projection.to_cols_array(),
        );

        for marker in frame.markers.iter().filter(|m| m.opacity > 0.0) {
            let model = Mat4::from_scale_rotation_translation(
                Vec3::splat(marker.scale),
                Quat::IDENTITY,
                marker.position,
            );
            self.gl
                .uniform_matrix4fv_with_f32_array(Some(&self.u_model), false, &model.to_cols_array());
            self.gl.uniform1f(Some(&self.u_opacity), marker.opacity);
            self.bind_vertices(&marker.resource().buffer);
            self.gl.draw_arrays(GL::LINES, 0, 4);
        }

        if !frame.line_vertices.is_empty() {
            self.gl.uniform_matrix4fv_with_f32_array(
                Some(&self.u_model),
                false,
                &Mat4::IDENTITY.to_cols_array(),
            );
            self.gl.uniform1f(Some(&self.u_opacity), frame.line_opacity);
            self.gl.bind_buffer(GL::ARRAY_BUFFER, Some(&self.line_buffer));
            self.upload(GL::DYNAMIC_DRAW, frame.line_vertices);
            self.bind_vertices(&self.line_buffer);
            self.gl
                .draw_arrays(GL::LINES, 0, frame.line_vertices.len() as i32);
        }

        Ok(())
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.gl.delete_buffer(Some(&self.line_buffer));
        self.gl.delete_program(Some(&self.program));
        self.overlay.detach();
        self.disposed = true;
        info!("WebGL2 backend disposed");
    }
}

fn compile_shader(gl: &GL, shader_type: u32, source: &str) -> TrailResult<WebGlShader> {
    let shader = gl
        .create_shader(shader_type)
        .ok_or_else(|| TrailError::Resource("could not create shader".into()))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);
    if gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(TrailError::Resource(format!("shader compile failed: {}", log)))
    }
}

fn link_program(gl: &GL, vert_src: &str, frag_src: &str) -> TrailResult<WebGlProgram> {
    let vert = compile_shader(gl, GL::VERTEX_SHADER, vert_src)?;
    let frag = match compile_shader(gl, GL::FRAGMENT_SHADER, frag_src) {
        Ok(frag) => frag,
        Err(e) => {
            gl.delete_shader(Some(&vert));
            return Err(e);
        }
    };

    let program = gl
        .create_program()
        .ok_or_else(|| TrailError::Resource("could not create program".into()))?;
    gl.attach_shader(&program, &vert);
    gl.attach_shader(&program, &frag);
    gl.link_program(&program);

    // Shaders are owned by the program once linked
    gl.delete_shader(Some(&vert));
    gl.delete_shader(Some(&frag));

    if gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        Err(TrailError::Resource(format!("program link failed: {}", log)))
    }
}
