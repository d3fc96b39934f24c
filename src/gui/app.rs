use crate::config::{self, Config};
use crate::events::AppEvent;
use crate::gui::theme::{self, ThemeColors};
use crate::scene::{PointerPhase, Scene};
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use sector::Point;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

pub struct AppInit {
    pub config: Config,
    pub config_path: PathBuf,
    pub initial_page: usize,
    pub events: async_channel::Receiver<AppEvent>,
}

pub struct AppModel {
    pub scene: Rc<RefCell<Scene>>,
    pub config_path: PathBuf,
    pub page: usize,
    pub page_count: usize,
    pub root: gtk::ApplicationWindow,
    pub drawing_area: gtk::DrawingArea,
}

#[derive(Debug)]
pub enum AppMsg {
    Pointer(PointerPhase, Point),
    NextPage,
    PreviousPage,
    PageShown(usize),
    ConfigReload,
    Quit,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

/// Monotonic clock shared with the frame clock, for pointer velocity.
fn now() -> Duration {
    Duration::from_micros(glib::monotonic_time().max(0) as u64)
}

fn paint(cr: &cairo::Context, scene: &mut Scene, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let bg = colors.background;
    cr.set_source_rgba(bg.red, bg.green, bg.blue, bg.alpha);
    cr.paint()?;
    scene.draw(cr)
}

fn title(page: usize, page_count: usize) -> String {
    if page_count == 0 {
        "Orbit".to_string()
    } else {
        format!("Orbit · page {} of {}", page + 1, page_count)
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = AppInit;
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            #[watch]
            set_title: Some(&title(model.page, model.page_count)),
            set_default_size: (640, 480),
            add_css_class: "orbit-window",

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    let msg = if key == gdk4::Key::Right || key == gdk4::Key::Page_Down {
                        AppMsg::NextPage
                    } else if key == gdk4::Key::Left || key == gdk4::Key::Page_Up {
                        AppMsg::PreviousPage
                    } else if key == gdk4::Key::Escape {
                        AppMsg::Quit
                    } else {
                        return glib::Propagation::Proceed;
                    };
                    sender.input(msg);
                    glib::Propagation::Stop
                }
            },

            #[name = "drawing_area"]
            gtk::DrawingArea {
                set_hexpand: true,
                set_vexpand: true,
                add_css_class: "orbit-drawing-area",

                add_controller = gtk::GestureDrag {
                    connect_drag_begin[sender] => move |_, x, y| {
                        sender.input(AppMsg::Pointer(PointerPhase::Down, Point::new(x, y)));
                    },
                    connect_drag_update[sender] => move |gesture, dx, dy| {
                        if let Some((x, y)) = gesture.start_point() {
                            let point = Point::new(x + dx, y + dy);
                            sender.input(AppMsg::Pointer(PointerPhase::Move, point));
                        }
                    },
                    connect_drag_end[sender] => move |gesture, dx, dy| {
                        if let Some((x, y)) = gesture.start_point() {
                            let point = Point::new(x + dx, y + dy);
                            sender.input(AppMsg::Pointer(PointerPhase::Up, point));
                        }
                    }
                }
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let AppInit {
            config,
            config_path,
            initial_page,
            events,
        } = init;

        theme::load_css();

        let page_sender = sender.clone();
        let scene = Scene::new(&config, initial_page, move |page| {
            page_sender.input(AppMsg::PageShown(page));
        });

        let model = AppModel {
            page: scene.current_page(),
            page_count: scene.page_count(),
            scene: Rc::new(RefCell::new(scene)),
            config_path,
            root: root.clone(),
            drawing_area: gtk::DrawingArea::default(),
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();

        let scene_draw = model.scene.clone();
        widgets
            .drawing_area
            .set_draw_func(move |drawing_area, cr, width, height| {
                let style_context = drawing_area.style_context();
                let colors = ThemeColors::from_context(&style_context);
                let mut scene = scene_draw.borrow_mut();
                scene.resize(width as f64, height as f64);
                if let Err(e) = paint(cr, &mut scene, &colors) {
                    log::error!("Drawing error: {}", e);
                }
            });

        let scene_tick = model.scene.clone();
        widgets
            .drawing_area
            .add_tick_callback(move |drawing_area, clock| {
                let frame_time = Duration::from_micros(clock.frame_time().max(0) as u64);
                let mut scene = scene_tick.borrow_mut();
                if scene.tick(frame_time) || scene.needs_paint() {
                    drawing_area.queue_draw();
                }
                glib::ControlFlow::Continue
            });

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = events.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, _sender: ComponentSender<Self>) {
        match msg {
            AppMsg::Pointer(phase, point) => {
                if self.scene.borrow_mut().pointer(phase, point, now()) {
                    self.drawing_area.queue_draw();
                }
            }
            AppMsg::NextPage | AppMsg::PreviousPage => {
                let scene = self.scene.borrow();
                let turn = if matches!(msg, AppMsg::NextPage) {
                    scene.next_page()
                } else {
                    scene.previous_page()
                };
                match turn {
                    Ok(handle) => {
                        relm4::spawn_local(async move {
                            let outcome = handle.finished().await;
                            log::debug!("Page turn {}", outcome);
                        });
                        self.drawing_area.queue_draw();
                    }
                    Err(e) => log::warn!("Cannot turn page: {}", e),
                }
            }
            AppMsg::PageShown(page) => {
                log::info!("Showing page {}", page + 1);
                self.page = page;
            }
            AppMsg::ConfigReload => match config::load_config(&self.config_path) {
                Ok(new_config) => {
                    let mut scene = self.scene.borrow_mut();
                    scene.reload(&new_config);
                    self.page = scene.current_page();
                    self.page_count = scene.page_count();
                    self.drawing_area.queue_draw();
                    log::info!("Configuration reloaded");
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
            AppMsg::Quit => self.root.close(),
        }
    }
}
