//! Global CSS styles for Agora.
//!
//! Light chat surface: indigo for own messages and primary actions, slate for
//! everyone else, rose for destructive actions and errors.

pub const GLOBAL_STYLES: &str = r#"
/* === CSS Custom Properties === */
:root {
  /* SURFACES */
  --surface: #ffffff;
  --surface-muted: #f8fafc;
  --surface-sunken: #f1f5f9;
  --border: #e2e8f0;

  /* ACCENTS */
  --indigo: #4f46e5;
  --indigo-dark: #4338ca;
  --indigo-soft: rgba(79, 70, 229, 0.12);
  --emerald: #059669;
  --rose: #e11d48;
  --amber: #d97706;

  /* TEXT */
  --text-primary: #0f172a;
  --text-secondary: #475569;
  --text-muted: #94a3b8;
  --text-inverse: #ffffff;

  /* Typography */
  --font-sans: 'Inter', -apple-system, 'Segoe UI', Roboto, sans-serif;
  --text-xs: 0.75rem;
  --text-sm: 0.875rem;
  --text-base: 1rem;
  --text-lg: 1.25rem;
  --text-xl: 1.75rem;

  /* Shape */
  --radius-sm: 6px;
  --radius: 12px;
  --radius-bubble: 18px;
  --shadow: 0 1px 3px rgba(15, 23, 42, 0.08), 0 4px 12px rgba(15, 23, 42, 0.06);

  /* Transitions */
  --transition-fast: 150ms ease;
  --transition-normal: 300ms ease;
}

/* === Global Reset === */
*, *::before, *::after {
  box-sizing: border-box;
  margin: 0;
  padding: 0;
}

html, body, #main {
  height: 100%;
}

body {
  font-family: var(--font-sans);
  font-size: var(--text-base);
  color: var(--text-primary);
  background: var(--surface-muted);
  -webkit-font-smoothing: antialiased;
}

.app-shell {
  height: 100%;
  display: flex;
  flex-direction: column;
}

/* === Buttons === */
.btn-primary, .btn-ghost, .btn-danger {
  font: inherit;
  font-size: var(--text-sm);
  font-weight: 600;
  border-radius: var(--radius-sm);
  padding: 0.55rem 1.1rem;
  cursor: pointer;
  border: 1px solid transparent;
  transition: background var(--transition-fast), color var(--transition-fast);
}

.btn-primary {
  background: var(--indigo);
  color: var(--text-inverse);
}

.btn-primary:hover:not(:disabled) {
  background: var(--indigo-dark);
}

.btn-ghost {
  background: transparent;
  color: var(--text-secondary);
}

.btn-ghost:hover:not(:disabled) {
  background: var(--surface-sunken);
  color: var(--text-primary);
}

.btn-danger {
  background: transparent;
  color: var(--rose);
  border-color: var(--rose);
}

.btn-danger:hover:not(:disabled) {
  background: var(--rose);
  color: var(--text-inverse);
}

button:disabled {
  opacity: 0.5;
  cursor: not-allowed;
}

.icon-btn {
  font: inherit;
  background: transparent;
  border: none;
  border-radius: var(--radius-sm);
  padding: 0.3rem 0.45rem;
  cursor: pointer;
  color: var(--text-secondary);
  line-height: 1;
}

.icon-btn:hover:not(:disabled) {
  background: var(--surface-sunken);
  color: var(--text-primary);
}

.icon-btn-danger:hover:not(:disabled) {
  color: var(--rose);
}

.close-btn {
  font-size: var(--text-lg);
}

.spinner {
  display: inline-block;
  width: 1em;
  height: 1em;
  border: 2px solid rgba(255, 255, 255, 0.4);
  border-top-color: var(--text-inverse);
  border-radius: 50%;
  animation: spin 0.8s linear infinite;
}

@keyframes spin {
  to { transform: rotate(360deg); }
}

/* === Inputs === */
.form-field {
  display: flex;
  flex-direction: column;
  gap: 0.35rem;
  position: relative;
  flex: 1;
}

.input-label {
  font-size: var(--text-sm);
  font-weight: 600;
  color: var(--text-secondary);
}

.input-field {
  font: inherit;
  width: 100%;
  padding: 0.65rem 0.85rem;
  border: 1px solid var(--border);
  border-radius: var(--radius-sm);
  background: var(--surface);
  color: var(--text-primary);
  transition: border-color var(--transition-fast), box-shadow var(--transition-fast);
}

.input-field:focus {
  outline: none;
  border-color: var(--indigo);
  box-shadow: 0 0 0 3px var(--indigo-soft);
}

.input-field::placeholder {
  color: var(--text-muted);
}

.input-counter {
  align-self: flex-end;
  font-size: var(--text-xs);
  color: var(--text-muted);
}

/* === Name Gate === */
.gate-page {
  height: 100%;
  display: flex;
  align-items: center;
  justify-content: center;
  padding: 1.5rem;
}

.gate-card {
  width: 100%;
  max-width: 380px;
  background: var(--surface);
  border-radius: var(--radius);
  box-shadow: var(--shadow);
  padding: 2rem;
  display: flex;
  flex-direction: column;
  gap: 1.25rem;
}

.gate-title {
  font-size: var(--text-xl);
  color: var(--indigo);
}

.gate-subtitle {
  color: var(--text-secondary);
  font-size: var(--text-sm);
}

.gate-actions {
  display: flex;
  flex-direction: column;
  gap: 0.5rem;
}

/* === Room === */
.room-page {
  height: 100%;
  display: flex;
  flex-direction: column;
}

.room-header {
  background: var(--surface);
  border-bottom: 1px solid var(--border);
  padding: 0.85rem 1.25rem;
  display: flex;
  flex-direction: column;
  gap: 0.35rem;
}

.room-heading {
  display: flex;
  align-items: center;
  gap: 0.6rem;
}

.room-title {
  font-size: var(--text-lg);
}

.room-badge {
  font-size: var(--text-xs);
  font-weight: 600;
  color: var(--indigo);
  background: var(--indigo-soft);
  padding: 0.15rem 0.5rem;
  border-radius: 999px;
}

.room-welcome {
  display: flex;
  align-items: center;
  justify-content: space-between;
  font-size: var(--text-sm);
  color: var(--text-secondary);
}

.live-status {
  margin-left: auto;
  display: flex;
  align-items: center;
  gap: 0.35rem;
  font-size: var(--text-xs);
  color: var(--text-muted);
}

.status-dot {
  width: 8px;
  height: 8px;
  border-radius: 50%;
  background: var(--text-muted);
}

.status-dot.pending {
  background: var(--amber);
}

.status-dot.active {
  background: var(--emerald);
  animation: pulse 2s ease-in-out infinite;
}

@keyframes pulse {
  0%, 100% { opacity: 1; }
  50% { opacity: 0.4; }
}

/* === Message List === */
.message-list {
  flex: 1;
  overflow-y: auto;
  padding: 1rem 1.25rem;
  display: flex;
  flex-direction: column;
  gap: 0.6rem;
}

.message-list.loading, .message-list.empty {
  align-items: center;
  justify-content: center;
  color: var(--text-muted);
  gap: 0.5rem;
}

.loading-spinner {
  width: 28px;
  height: 28px;
  border: 3px solid var(--border);
  border-top-color: var(--indigo);
  border-radius: 50%;
  animation: spin 0.8s linear infinite;
}

.empty-state-message {
  font-weight: 600;
  color: var(--text-secondary);
}

.empty-state-hint {
  font-size: var(--text-sm);
}

.message-row {
  display: flex;
}

.message-row-sent {
  justify-content: flex-end;
}

.message-row-received {
  justify-content: flex-start;
}

.message-enter {
  animation: message-in 500ms ease-out;
}

@keyframes message-in {
  from { opacity: 0; transform: translateY(8px); }
  to { opacity: 1; transform: translateY(0); }
}

.message-bubble {
  max-width: 75%;
  padding: 0.55rem 0.85rem;
  border-radius: var(--radius-bubble);
  display: flex;
  flex-direction: column;
  gap: 0.3rem;
  position: relative;
}

.message-bubble-sent {
  background: var(--indigo);
  color: var(--text-inverse);
  border-bottom-right-radius: var(--radius-sm);
}

.message-bubble-received {
  background: var(--surface);
  border: 1px solid var(--border);
  border-bottom-left-radius: var(--radius-sm);
}

.message-bubble-sender {
  font-size: var(--text-xs);
  font-weight: 600;
  color: var(--indigo);
}

.message-bubble-content {
  white-space: pre-wrap;
  word-break: break-word;
}

.message-bubble-footer {
  display: flex;
  align-items: center;
  justify-content: space-between;
  gap: 0.75rem;
}

.message-bubble-time {
  font-size: var(--text-xs);
  opacity: 0.7;
}

.message-actions {
  display: flex;
  gap: 0.15rem;
  opacity: 0;
  transition: opacity var(--transition-fast);
}

.message-bubble:hover .message-actions {
  opacity: 1;
}

.message-bubble-sent .icon-btn {
  color: rgba(255, 255, 255, 0.85);
}

.message-bubble-sent .icon-btn:hover:not(:disabled) {
  background: rgba(255, 255, 255, 0.15);
  color: var(--text-inverse);
}

/* === Attachments === */
.attachment-image {
  position: relative;
}

.attachment-image img {
  display: block;
  max-width: 260px;
  max-height: 260px;
  border-radius: var(--radius);
  cursor: zoom-in;
}

.attachment-image-placeholder {
  font-size: var(--text-sm);
  padding: 1rem;
  border-radius: var(--radius);
  background: var(--surface-sunken);
  color: var(--text-secondary);
}

.attachment-download-overlay {
  position: absolute;
  top: 0.4rem;
  right: 0.4rem;
  border: none;
  border-radius: 50%;
  width: 2rem;
  height: 2rem;
  background: rgba(15, 23, 42, 0.6);
  color: var(--text-inverse);
  cursor: pointer;
  opacity: 0;
  transition: opacity var(--transition-fast);
}

.attachment-image:hover .attachment-download-overlay {
  opacity: 1;
}

.lightbox {
  position: fixed;
  inset: 0;
  background: rgba(15, 23, 42, 0.85);
  display: flex;
  align-items: center;
  justify-content: center;
  z-index: 50;
  cursor: zoom-out;
}

.lightbox .lightbox-image {
  max-width: 92vw;
  max-height: 92vh;
  border-radius: var(--radius-sm);
  cursor: zoom-out;
}

.attachment-card {
  display: flex;
  align-items: center;
  gap: 0.6rem;
  padding: 0.5rem 0.65rem;
  border-radius: var(--radius-sm);
  background: var(--surface-sunken);
  color: var(--text-primary);
}

.attachment-meta {
  display: flex;
  flex-direction: column;
  min-width: 0;
}

.attachment-name {
  font-size: var(--text-sm);
  font-weight: 600;
  overflow: hidden;
  text-overflow: ellipsis;
  white-space: nowrap;
}

.attachment-size {
  font-size: var(--text-xs);
  color: var(--text-secondary);
}

.attachment-download {
  margin-left: auto;
  font: inherit;
  font-size: var(--text-xs);
  font-weight: 600;
  border: none;
  background: transparent;
  color: var(--indigo);
  cursor: pointer;
}

/* === Composer === */
.composer {
  background: var(--surface);
  border-top: 1px solid var(--border);
  padding: 0.75rem 1.25rem;
  display: flex;
  flex-direction: column;
  gap: 0.5rem;
  transition: background var(--transition-fast);
}

.composer.drag-over {
  background: var(--indigo-soft);
  outline: 2px dashed var(--indigo);
  outline-offset: -6px;
}

.composer-row {
  display: flex;
  align-items: flex-start;
  gap: 0.5rem;
}

.file-chip {
  align-self: flex-start;
  display: flex;
  align-items: center;
  gap: 0.5rem;
  padding: 0.25rem 0.35rem 0.25rem 0.75rem;
  border-radius: 999px;
  background: var(--surface-sunken);
  font-size: var(--text-sm);
}

.file-chip-size {
  color: var(--text-muted);
  font-size: var(--text-xs);
}

/* === Toasts === */
.toast-stack {
  position: fixed;
  bottom: 5.5rem;
  left: 50%;
  transform: translateX(-50%);
  display: flex;
  flex-direction: column;
  gap: 0.5rem;
  z-index: 60;
  pointer-events: none;
}

.toast {
  pointer-events: auto;
  min-width: 240px;
  max-width: 420px;
  padding: 0.65rem 1rem;
  border-radius: var(--radius-sm);
  box-shadow: var(--shadow);
  font-size: var(--text-sm);
  color: var(--text-inverse);
  cursor: pointer;
  animation: message-in 200ms ease-out;
}

.toast-info {
  background: var(--text-secondary);
}

.toast-success {
  background: var(--emerald);
}

.toast-error {
  background: var(--rose);
}

/* === Fatal === */
.fatal-screen {
  height: 100%;
  display: flex;
  flex-direction: column;
  align-items: center;
  justify-content: center;
  gap: 0.75rem;
  padding: 2rem;
  text-align: center;
}

.fatal-detail {
  color: var(--text-secondary);
  font-size: var(--text-sm);
}
"#;
