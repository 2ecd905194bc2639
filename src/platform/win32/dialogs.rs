//! Modal alert and prompt dialogs built from raw Win32 controls.
//!
//! The prompt dialog disables its owner and runs a local message loop until
//! the user confirms or cancels, then hands the typed text back.

#![allow(unsafe_op_in_unsafe_fn)]

use std::thread;
use std::time::Duration;

use windows::Win32::Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, WIN32_ERROR, WPARAM};
use windows::Win32::Graphics::Gdi::{DEFAULT_GUI_FONT, GetStockObject, HFONT};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{EnableWindow, SetFocus};
use windows::Win32::UI::WindowsAndMessaging::*;
use windows::core::{PCWSTR, w};

use super::{WindowError, to_wstring};

const DIALOG_WIDTH: i32 = 420;
const DIALOG_HEIGHT: i32 = 170;

// IsDialogMessageW maps Enter and Escape to these ids
const ID_OK: i32 = 1;
const ID_CANCEL: i32 = 2;
const ID_EDIT: i32 = 1001;

// Matches the Win32 ERROR_CLASS_ALREADY_EXISTS (1410) code.
const CLASS_ALREADY_EXISTS_ERR: WIN32_ERROR = WIN32_ERROR(1410);

/// Shows a modal message box
pub fn alert(owner: HWND, message: &str) {
    let wide = to_wstring(message);
    unsafe {
        MessageBoxW(owner, PCWSTR(wide.as_ptr()), w!("Map Prompt"), MB_OK | MB_ICONWARNING);
    }
}

/// Asks for one line of text. `None` when the user cancels or closes.
pub fn ask_prompt(owner: HWND, message: &str) -> Result<Option<String>, WindowError> {
    let state = PromptState {
        hwnd: HWND(0),
        edit: HWND(0),
        message: message.to_string(),
        answer: None,
        closed: false,
        font: unsafe { HFONT(GetStockObject(DEFAULT_GUI_FONT).0) },
    };
    let state_ptr = Box::into_raw(Box::new(state));

    unsafe {
        if let Err(err) = create_prompt_window(owner, state_ptr) {
            drop(Box::from_raw(state_ptr));
            return Err(err);
        }
        if owner.0 != 0 {
            EnableWindow(owner, false);
        }
        ShowWindow((*state_ptr).hwnd, SW_SHOW);
        let _ = SetForegroundWindow((*state_ptr).hwnd);
        SetFocus((*state_ptr).edit);
    }

    run_modal_loop(state_ptr);

    unsafe {
        if owner.0 != 0 {
            EnableWindow(owner, true);
            let _ = SetForegroundWindow(owner);
        }
    }

    let state = unsafe { Box::from_raw(state_ptr) };
    Ok(state.answer)
}

struct PromptState {
    hwnd: HWND,
    edit: HWND,
    message: String,
    answer: Option<String>,
    closed: bool,
    font: HFONT,
}

fn create_prompt_window(owner: HWND, state_ptr: *mut PromptState) -> Result<(), WindowError> {
    unsafe {
        let module = GetModuleHandleW(PCWSTR::null())
            .map_err(|e| WindowError::Win32Error(format!("{:?}", e)))?;
        let instance: HINSTANCE = module.into();

        register_prompt_class(instance)?;

        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE(WS_EX_CONTROLPARENT.0 | WS_EX_DLGMODALFRAME.0),
            w!("MapPromptTextDialog"),
            w!("Map Prompt"),
            WS_OVERLAPPED | WS_CAPTION | WS_SYSMENU,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            DIALOG_WIDTH,
            DIALOG_HEIGHT,
            owner,
            None,
            instance,
            Some(state_ptr as *const _ as *mut _),
        );

        if hwnd.0 == 0 {
            return Err(WindowError::WindowCreationFailed);
        }

        (*state_ptr).hwnd = hwnd;
        Ok(())
    }
}

fn register_prompt_class(instance: HINSTANCE) -> Result<(), WindowError> {
    unsafe {
        let wnd_class = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(prompt_wnd_proc),
            hInstance: instance,
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            lpszClassName: w!("MapPromptTextDialog"),
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

unsafe extern "system" fn prompt_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_CREATE => {
            let createstruct = &*(lparam.0 as *const CREATESTRUCTW);
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, createstruct.lpCreateParams as isize);
            if let Some(state) = prompt_state_mut(hwnd) {
                state.hwnd = hwnd;
                state.build_controls();
            }
            LRESULT(0)
        }
        WM_COMMAND => {
            let id = (wparam.0 & 0xffff) as i32;
            if let Some(state) = prompt_state_mut(hwnd) {
                match id {
                    ID_OK => state.confirm(),
                    ID_CANCEL => state.cancel(),
                    _ => {}
                }
            }
            LRESULT(0)
        }
        WM_CLOSE => {
            if let Some(state) = prompt_state_mut(hwnd) {
                state.cancel();
            } else {
                let _ = DestroyWindow(hwnd);
            }
            LRESULT(0)
        }
        WM_DESTROY => {
            if let Some(state) = prompt_state_mut(hwnd) {
                state.closed = true;
                state.hwnd = HWND(0);
            }
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

fn run_modal_loop(state_ptr: *mut PromptState) {
    unsafe {
        let mut msg = MSG::default();
        while !(*state_ptr).closed && IsWindow((*state_ptr).hwnd).as_bool() {
            if PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                if msg.message == WM_QUIT {
                    let _ = PostMessageW(HWND(0), WM_QUIT, msg.wParam, msg.lParam);
                    break;
                }

                if !IsDialogMessageW((*state_ptr).hwnd, &msg).as_bool() {
                    TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            } else {
                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

unsafe fn prompt_state_mut(hwnd: HWND) -> Option<&'static mut PromptState> {
    let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut PromptState;
    if ptr.is_null() { None } else { Some(&mut *ptr) }
}

impl PromptState {
    fn build_controls(&mut self) {
        unsafe {
            let label = to_wstring(&self.message);
            let text = CreateWindowExW(
                WINDOW_EX_STYLE(0),
                w!("STATIC"),
                PCWSTR(label.as_ptr()),
                WS_CHILD | WS_VISIBLE,
                16,
                14,
                DIALOG_WIDTH - 48,
                20,
                self.hwnd,
                None,
                None,
                None,
            );
            apply_font(text, self.font);

            let edit_style = WS_CHILD.0 | WS_VISIBLE.0 | WS_BORDER.0 | WS_TABSTOP.0 | (ES_AUTOHSCROLL as u32);
            self.edit = CreateWindowExW(
                WINDOW_EX_STYLE(0),
                w!("EDIT"),
                PCWSTR::null(),
                WINDOW_STYLE(edit_style),
                16,
                40,
                DIALOG_WIDTH - 48,
                24,
                self.hwnd,
                HMENU(ID_EDIT as isize),
                None,
                None,
            );
            apply_font(self.edit, self.font);

            let ok_style = WINDOW_STYLE(WS_CHILD.0 | WS_VISIBLE.0 | WS_TABSTOP.0 | (BS_DEFPUSHBUTTON as u32));
            let ok = CreateWindowExW(
                WINDOW_EX_STYLE(0),
                w!("BUTTON"),
                w!("OK"),
                ok_style,
                DIALOG_WIDTH - 212,
                DIALOG_HEIGHT - 86,
                86,
                26,
                self.hwnd,
                HMENU(ID_OK as isize),
                None,
                None,
            );
            apply_font(ok, self.font);

            let cancel = CreateWindowExW(
                WINDOW_EX_STYLE(0),
                w!("BUTTON"),
                w!("Cancel"),
                WINDOW_STYLE(WS_CHILD.0 | WS_VISIBLE.0 | WS_TABSTOP.0),
                DIALOG_WIDTH - 118,
                DIALOG_HEIGHT - 86,
                86,
                26,
                self.hwnd,
                HMENU(ID_CANCEL as isize),
                None,
                None,
            );
            apply_font(cancel, self.font);
        }
    }

    fn confirm(&mut self) {
        self.answer = Some(read_text(self.edit));
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
    }

    fn cancel(&mut self) {
        self.answer = None;
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

fn read_text(hwnd: HWND) -> String {
    unsafe {
        let len = GetWindowTextLengthW(hwnd).max(0) as usize;
        let mut buffer = vec![0u16; len + 1];
        let copied = GetWindowTextW(hwnd, &mut buffer).max(0) as usize;
        String::from_utf16_lossy(&buffer[..copied])
    }
}

fn apply_font(hwnd: HWND, font: HFONT) {
    unsafe {
        SendMessageW(hwnd, WM_SETFONT, WPARAM(font.0 as usize), LPARAM(1));
    }
}
