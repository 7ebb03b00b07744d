// Interactive viewer: drag with the left mouse button to stir the fluid.
// Keys: R reset, S screenshot, [ / ] halve / double the grid, Esc quit.
// Run with: cargo run --release --bin fluid_canvas

use std::sync::Arc;

use fluid_canvas::{
    capture,
    input::CursorTracker,
    render::TextureRenderer,
    timing::FrameClock,
    FluidSimulator, InputSource, Renderer, SimulationSettings,
};
use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
};

const WINDOW_SIZE: u32 = 800;

fn update_window_title(window: &winit::window::Window, sim: &FluidSimulator, clock: &mut FrameClock) {
    if let Some((fps, frame_time_ms)) = clock.poll_rate() {
        let title = format!(
            "Fluid Canvas - {}x{} | {:.0} FPS | {:.2} ms/frame | density {:.1}",
            sim.width(),
            sim.height(),
            fps,
            frame_time_ms,
            sim.grid().total_density()
        );
        window.set_title(&title);
    }
}

fn resize_grid(sim: &mut FluidSimulator, tracker: &mut CursorTracker, width: usize, height: usize) {
    sim.resize(width, height);
    tracker.set_grid_size(sim.width(), sim.height());
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let settings_path = SimulationSettings::default_path();
    let settings = SimulationSettings::load_or_create(&settings_path);

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        event_loop.create_window(
            winit::window::WindowAttributes::default()
                .with_title("Fluid Canvas")
                .with_inner_size(winit::dpi::PhysicalSize::new(WINDOW_SIZE, WINDOW_SIZE)),
        )?,
    );

    let mut renderer = pollster::block_on(TextureRenderer::new(window.clone()))?;
    let mut sim = FluidSimulator::new(settings);
    let (surface_width, surface_height) = renderer.surface_size();
    let mut tracker = CursorTracker::new(surface_width, surface_height, sim.width(), sim.height());
    let mut clock = FrameClock::new();

    event_loop.run(move |event, control_flow| match event {
        Event::WindowEvent { ref event, window_id } if window_id == window.id() => match event {
            WindowEvent::CloseRequested => control_flow.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match key {
                KeyCode::Escape => control_flow.exit(),
                KeyCode::KeyR => sim.reset(),
                KeyCode::KeyS => {
                    let dir = std::env::current_dir().unwrap_or_else(|_| ".".into());
                    let path = capture::screenshot_path(&dir);
                    match capture::save_frame(&path, sim.pixels(), sim.width() as u32, sim.height() as u32) {
                        Ok(()) => log::info!("Saved screenshot to {}", path.display()),
                        Err(err) => log::error!("Failed to save screenshot: {err:?}"),
                    }
                }
                KeyCode::BracketLeft => {
                    let (w, h) = (sim.width() / 2, sim.height() / 2);
                    resize_grid(&mut sim, &mut tracker, w, h);
                }
                KeyCode::BracketRight => {
                    let (w, h) = (sim.width() * 2, sim.height() * 2);
                    resize_grid(&mut sim, &mut tracker, w, h);
                }
                _ => {}
            },
            WindowEvent::CursorMoved { position, .. } => {
                tracker.set_cursor(position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => tracker.cursor_left(),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                tracker.set_pressed(*state == ElementState::Pressed);
            }
            WindowEvent::Resized(physical_size) => {
                renderer.resize_surface(physical_size.width, physical_size.height);
                tracker.set_window_size(physical_size.width, physical_size.height);
            }
            WindowEvent::RedrawRequested => {
                let dt = clock.tick();
                sim.tick(dt, tracker.pointer());
                update_window_title(&window, &sim, &mut clock);

                if let Err(err) = renderer.present(sim.pixels(), sim.width() as u32, sim.height() as u32) {
                    log::error!("Render failed: {err:?}");
                    control_flow.exit();
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            window.request_redraw();
        }
        _ => {}
    })?;

    Ok(())
}
