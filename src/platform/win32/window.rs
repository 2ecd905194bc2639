//! The map window
//!
//! One top-level window hosts the whole shell. Frames are rendered with
//! tiny-skia and blitted as a top-down DIB on WM_PAINT. Dispatcher
//! completions arrive as a posted [`WM_APP_COMPLETION`]. Alerts and prompt
//! requests are queued and deferred through [`WM_APP_ALERT`] and
//! [`WM_APP_PROMPT`], so no modal loop ever runs while the window state is
//! borrowed.

#![allow(unsafe_op_in_unsafe_fn)]

use std::collections::VecDeque;
use std::ffi::c_void;
use std::sync::Arc;
use std::sync::atomic::{AtomicIsize, Ordering};

use crossbeam_channel::Receiver;
use windows::Win32::Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, POINT, WIN32_ERROR, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BeginPaint, DIB_RGB_COLORS, EndPaint, InvalidateRect,
    PAINTSTRUCT, ScreenToClient, SetDIBitsToDevice, UpdateWindow,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    ReleaseCapture, SetCapture, TME_LEAVE, TRACKMOUSEEVENT, TrackMouseEvent,
};
use windows::Win32::UI::WindowsAndMessaging::*;
use windows::core::{PCWSTR, w};

use super::{WindowError, dialogs};
use crate::app::controller::{MapController, PROMPT_MESSAGE, ShellCommand};
use crate::app::dispatch::{Completion, Waker};
use crate::input::{Intent, Key, PointerTracker, button_intent, key_intent};
use crate::ui::layout::{Control, ShellLayout};
use crate::ui::renderer::{Frame, ShellRenderer, pixmap_to_bgra};
use crate::ui::shell::SearchBox;

/// Posted by dispatcher workers after queueing a completion
pub const WM_APP_COMPLETION: u32 = WM_APP + 1;
/// Posted to open the prompt dialog outside of any other handler
pub const WM_APP_PROMPT: u32 = WM_APP + 2;
/// Posted to show the oldest queued alert outside of any other handler
pub const WM_APP_ALERT: u32 = WM_APP + 3;

// commctrl.h
const WM_MOUSELEAVE: u32 = 0x02A3;

// Matches the Win32 ERROR_CLASS_ALREADY_EXISTS (1410) code.
const CLASS_ALREADY_EXISTS_ERR: WIN32_ERROR = WIN32_ERROR(1410);

/// Window handle shared with worker threads, zero until the window exists
#[derive(Clone, Default)]
pub struct WakeTarget(Arc<AtomicIsize>);

impl WakeTarget {
    /// Waker that posts [`WM_APP_COMPLETION`] to the window once it exists
    pub fn waker(&self) -> Waker {
        let target = Arc::clone(&self.0);
        Arc::new(move || {
            let raw = target.load(Ordering::Acquire);
            if raw != 0 {
                unsafe {
                    let _ = PostMessageW(HWND(raw), WM_APP_COMPLETION, WPARAM(0), LPARAM(0));
                }
            }
        })
    }

    fn set(&self, hwnd: HWND) {
        self.0.store(hwnd.0, Ordering::Release);
    }
}

struct MapWindow {
    hwnd: HWND,
    controller: MapController,
    completions: Receiver<Completion>,
    renderer: ShellRenderer,
    layout: ShellLayout,
    search: SearchBox,
    pointer: PointerTracker,
    pressed: Option<Control>,
    tracking_leave: bool,
    pointer_in_map: bool,
    dialogs: DialogQueue,
}

/// Modal work waiting to run from its own posted message
#[derive(Debug, Default)]
struct DialogQueue {
    alerts: VecDeque<String>,
    prompt_queued: bool,
}

impl DialogQueue {
    /// Each queued alert is paired with one posted `WM_APP_ALERT`
    fn push_alert(&mut self, message: String) {
        self.alerts.push_back(message);
    }

    fn next_alert(&mut self) -> Option<String> {
        self.alerts.pop_front()
    }

    /// Marks a prompt as requested; `false` when one is already on its way
    fn queue_prompt(&mut self) -> bool {
        !std::mem::replace(&mut self.prompt_queued, true)
    }

    fn take_prompt(&mut self) {
        self.prompt_queued = false;
    }
}

/// Creates the window and runs the message loop until it is closed
pub fn run(
    controller: MapController,
    completions: Receiver<Completion>,
    renderer: ShellRenderer,
    wake: WakeTarget,
    width: i32,
    height: i32,
) -> Result<(), WindowError> {
    let window = MapWindow {
        hwnd: HWND(0),
        controller,
        completions,
        renderer,
        layout: ShellLayout::compute(width, height),
        search: SearchBox::new(),
        pointer: PointerTracker::new(),
        pressed: None,
        tracking_leave: false,
        pointer_in_map: false,
        dialogs: DialogQueue::default(),
    };
    let window_ptr = Box::into_raw(Box::new(window));

    unsafe {
        let hwnd = match create_map_window(window_ptr, width, height) {
            Ok(hwnd) => hwnd,
            Err(err) => {
                drop(Box::from_raw(window_ptr));
                return Err(err);
            }
        };
        wake.set(hwnd);
        ShowWindow(hwnd, SW_SHOW);
        UpdateWindow(hwnd);
        // Completions that finished before the window existed
        let _ = PostMessageW(hwnd, WM_APP_COMPLETION, WPARAM(0), LPARAM(0));

        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        wake.set(HWND(0));
        let mut window = Box::from_raw(window_ptr);
        window.controller.finish();
        window.drain_results();
    }

    log::info!("Map window closed");
    Ok(())
}

fn create_map_window(window_ptr: *mut MapWindow, width: i32, height: i32) -> Result<HWND, WindowError> {
    unsafe {
        let module = GetModuleHandleW(PCWSTR::null())
            .map_err(|e| WindowError::Win32Error(format!("{:?}", e)))?;
        let instance: HINSTANCE = module.into();

        register_map_class(instance)?;

        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE(0),
            w!("MapPromptWindow"),
            w!("Map Prompt"),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            width,
            height,
            None,
            None,
            instance,
            Some(window_ptr as *const _ as *mut _),
        );

        if hwnd.0 == 0 {
            return Err(WindowError::WindowCreationFailed);
        }
        Ok(hwnd)
    }
}

fn register_map_class(instance: HINSTANCE) -> Result<(), WindowError> {
    unsafe {
        let wnd_class = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(map_wnd_proc),
            hInstance: instance,
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            lpszClassName: w!("MapPromptWindow"),
            ..Default::default()
        };

        if RegisterClassW(&wnd_class) == 0 {
            match GetLastError() {
                Err(err) if err.code() == CLASS_ALREADY_EXISTS_ERR.to_hresult() => {}
                _ => return Err(WindowError::ClassRegistrationFailed),
            }
        }
    }
    Ok(())
}

unsafe fn window_state_mut(hwnd: HWND) -> Option<&'static mut MapWindow> {
    let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut MapWindow;
    if ptr.is_null() { None } else { Some(&mut *ptr) }
}

fn point_from_lparam(lparam: LPARAM) -> (i32, i32) {
    let x = (lparam.0 & 0xffff) as u16 as i16 as i32;
    let y = ((lparam.0 >> 16) & 0xffff) as u16 as i16 as i32;
    (x, y)
}

unsafe extern "system" fn map_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_CREATE {
        let createstruct = &*(lparam.0 as *const CREATESTRUCTW);
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, createstruct.lpCreateParams as isize);
        if let Some(window) = window_state_mut(hwnd) {
            window.hwnd = hwnd;
        }
        return LRESULT(0);
    }

    if msg == WM_APP_PROMPT {
        show_prompt(hwnd);
        return LRESULT(0);
    }

    if msg == WM_APP_ALERT {
        show_alert(hwnd);
        return LRESULT(0);
    }

    let Some(window) = window_state_mut(hwnd) else {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    };

    match msg {
        WM_SIZE => {
            let width = (lparam.0 & 0xffff) as i32;
            let height = ((lparam.0 >> 16) & 0xffff) as i32;
            window.resize(width, height);
            LRESULT(0)
        }
        WM_ERASEBKGND => LRESULT(1),
        WM_PAINT => {
            window.paint();
            LRESULT(0)
        }
        WM_LBUTTONDOWN => {
            let (x, y) = point_from_lparam(lparam);
            window.on_button_down(x, y);
            LRESULT(0)
        }
        WM_LBUTTONUP => {
            let (x, y) = point_from_lparam(lparam);
            window.on_button_up(x, y);
            LRESULT(0)
        }
        WM_MOUSEMOVE => {
            let (x, y) = point_from_lparam(lparam);
            window.on_mouse_move(x, y);
            LRESULT(0)
        }
        WM_MOUSELEAVE => {
            window.tracking_leave = false;
            window.leave_map();
            LRESULT(0)
        }
        WM_MOUSEWHEEL => {
            let delta = ((wparam.0 >> 16) & 0xffff) as u16 as i16;
            let (sx, sy) = point_from_lparam(lparam);
            let mut point = POINT { x: sx, y: sy };
            let _ = ScreenToClient(hwnd, &mut point);
            window.on_wheel(delta as f64 / WHEEL_DELTA as f64, point.x, point.y);
            LRESULT(0)
        }
        WM_KEYDOWN => {
            window.on_key(Key::from_vk_code(wparam.0 as u32));
            LRESULT(0)
        }
        WM_CHAR => {
            // UTF-16 code unit; characters outside the BMP come as two
            window.on_char_unit(wparam.0 as u16);
            LRESULT(0)
        }
        WM_APP_COMPLETION => {
            window.drain_completions();
            LRESULT(0)
        }
        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// Shows one queued alert without holding the window state
unsafe fn show_alert(hwnd: HWND) {
    let message = window_state_mut(hwnd).and_then(|window| window.dialogs.next_alert());
    if let Some(message) = message {
        dialogs::alert(hwnd, &message);
    }
}

/// Runs the prompt dialog without holding the window state
unsafe fn show_prompt(hwnd: HWND) {
    let pending = match window_state_mut(hwnd) {
        Some(window) => {
            window.dialogs.take_prompt();
            window.controller.state().pending_prompt()
        }
        None => None,
    };
    let Some(pending) = pending else {
        return;
    };

    let message = format!(
        "{}\n({} {} within {})",
        PROMPT_MESSAGE,
        pending.origin.label(),
        pending.coordinate,
        pending.radius
    );
    let answer = match dialogs::ask_prompt(hwnd, &message) {
        Ok(answer) => answer,
        Err(err) => {
            log::error!("Failed to open the prompt dialog: {}", err);
            None
        }
    };

    if let Some(window) = window_state_mut(hwnd) {
        let commands = window.controller.answer_prompt(answer);
        window.execute(commands);
    }
}

impl MapWindow {
    fn resize(&mut self, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        self.layout = ShellLayout::compute(width, height);
        self.controller
            .resize_map(self.layout.map.w as f64, self.layout.map.h as f64);
        self.invalidate();
    }

    fn post(&self, msg: u32) {
        unsafe {
            let _ = PostMessageW(self.hwnd, msg, WPARAM(0), LPARAM(0));
        }
    }

    fn invalidate(&self) {
        unsafe {
            InvalidateRect(self.hwnd, None, false);
        }
    }

    fn paint(&mut self) {
        unsafe {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(self.hwnd, &mut ps);

            let scene = self.controller.scene(self.layout.map);
            let status = self.controller.status_text();
            let frame = Frame {
                layout: &self.layout,
                scene: &scene,
                search: &self.search,
                status: &status,
                pressed: self.pressed,
                selecting: self.controller.state().selecting(),
            };

            match self.renderer.render(&frame) {
                Ok(pixmap) => {
                    let width = pixmap.width() as i32;
                    let height = pixmap.height() as i32;
                    let pixels = pixmap_to_bgra(&pixmap);

                    let mut bitmap_info = BITMAPINFO::default();
                    bitmap_info.bmiHeader = BITMAPINFOHEADER {
                        biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                        biWidth: width,
                        biHeight: -height, // top-down bitmap so we can copy directly
                        biPlanes: 1,
                        biBitCount: 32,
                        biCompression: BI_RGB.0,
                        ..Default::default()
                    };

                    SetDIBitsToDevice(
                        hdc,
                        0,
                        0,
                        width as u32,
                        height as u32,
                        0,
                        0,
                        0,
                        height as u32,
                        pixels.as_ptr() as *const c_void,
                        &bitmap_info,
                        DIB_RGB_COLORS,
                    );
                }
                Err(err) => log::error!("Failed to render frame: {}", err),
            }

            EndPaint(self.hwnd, &ps);
        }
    }

    fn on_button_down(&mut self, x: i32, y: i32) {
        let hit = self.layout.hit_test(x, y);
        self.search.set_focused(hit == Some(Control::SearchBox));

        match hit {
            Some(Control::Map) => {
                let (mx, my) = self.layout.to_map(x, y);
                self.pointer.on_press(mx, my);
                unsafe {
                    SetCapture(self.hwnd);
                }
            }
            Some(control) if control.is_button() => self.pressed = Some(control),
            _ => {}
        }
        self.invalidate();
    }

    fn on_button_up(&mut self, x: i32, y: i32) {
        unsafe {
            let _ = ReleaseCapture();
        }

        if let Some(control) = self.pressed.take() {
            if self.layout.hit_test(x, y) == Some(control) {
                let step = self.controller.radius_step();
                if let Some(intent) = button_intent(control, step, self.search.text()) {
                    self.dispatch(intent);
                }
            }
            self.invalidate();
            return;
        }

        let (mx, my) = self.layout.to_map(x, y);
        let intent = self.pointer.on_release(mx, my, self.controller.viewport());
        if let Some(intent) = intent {
            self.dispatch(intent);
        }
    }

    fn on_mouse_move(&mut self, x: i32, y: i32) {
        if !self.tracking_leave {
            let mut track = TRACKMOUSEEVENT {
                cbSize: std::mem::size_of::<TRACKMOUSEEVENT>() as u32,
                dwFlags: TME_LEAVE,
                hwndTrack: self.hwnd,
                dwHoverTime: 0,
            };
            unsafe {
                self.tracking_leave = TrackMouseEvent(&mut track).is_ok();
            }
        }

        let over_map = self.layout.map.contains_point(x, y);
        if over_map || self.pointer.is_dragging() {
            self.pointer_in_map = over_map;
            let (mx, my) = self.layout.to_map(x, y);
            let intent = self.pointer.on_move(mx, my, self.controller.viewport());
            if let Some(intent) = intent {
                self.dispatch(intent);
            }
        } else {
            self.leave_map();
        }
    }

    fn leave_map(&mut self) {
        if self.pointer_in_map {
            self.pointer_in_map = false;
            let intent = self.pointer.on_leave();
            self.dispatch(intent);
        }
    }

    fn on_wheel(&mut self, notches: f64, x: i32, y: i32) {
        if !self.layout.map.contains_point(x, y) {
            return;
        }
        let (mx, my) = self.layout.to_map(x, y);
        let intent = self.pointer.on_wheel(notches, mx, my);
        self.dispatch(intent);
    }

    fn on_key(&mut self, key: Key) {
        // Arrow keys work regardless of search box focus
        if let Some(intent) = key_intent(key, self.controller.radius_step()) {
            self.dispatch(intent);
            return;
        }
        if !self.search.is_focused() {
            return;
        }
        match key {
            Key::Enter => {
                if let Some(city) = self.search.submit() {
                    self.dispatch(Intent::Search(city));
                }
            }
            Key::Backspace => {
                self.search.backspace();
                self.invalidate();
            }
            Key::Escape => {
                self.search.set_focused(false);
                self.invalidate();
            }
            _ => {}
        }
    }

    fn on_char_unit(&mut self, unit: u16) {
        if self.search.is_focused() && self.search.insert_utf16(unit) {
            self.invalidate();
        }
    }

    fn drain_completions(&mut self) {
        let completions: Vec<Completion> = self.completions.try_iter().collect();
        for completion in completions {
            let commands = self.controller.handle_completion(completion);
            self.execute(commands);
        }
    }

    /// Hands completions to the controller once the window is gone, so
    /// their results still reach the log
    fn drain_results(&mut self) {
        for completion in self.completions.try_iter() {
            self.controller.handle_completion(completion);
        }
    }

    fn dispatch(&mut self, intent: Intent) {
        let commands = self.controller.handle_intent(intent);
        self.execute(commands);
    }

    fn execute(&mut self, commands: Vec<ShellCommand>) {
        for command in commands {
            match command {
                ShellCommand::Redraw => self.invalidate(),
                ShellCommand::Alert(message) => {
                    self.dialogs.push_alert(message);
                    self.post(WM_APP_ALERT);
                }
                ShellCommand::AskPrompt(_) => {
                    if self.dialogs.queue_prompt() {
                        self.invalidate();
                        self.post(WM_APP_PROMPT);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alerts_are_shown_in_order() {
        let mut queue = DialogQueue::default();
        queue.push_alert("City not found.".to_string());
        queue.push_alert("Lookup failed".to_string());
        assert_eq!(queue.next_alert().as_deref(), Some("City not found."));
        assert_eq!(queue.next_alert().as_deref(), Some("Lookup failed"));
        assert_eq!(queue.next_alert(), None);
    }

    #[test]
    fn one_prompt_request_at_a_time() {
        let mut queue = DialogQueue::default();
        assert!(queue.queue_prompt());
        assert!(!queue.queue_prompt());
        queue.take_prompt();
        assert!(queue.queue_prompt());
    }
}
