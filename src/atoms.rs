//! Fixed JavaScript snippets installed by element operations.
//!
//! Each atom is a function literal passed to `Runtime.callFunctionOn` with
//! the element as `this`. They are contracts, not configuration: element
//! methods depend on their exact behavior.

/// Clears an input/textarea value, or the text content otherwise.
pub(crate) const CLEAR_INPUT: &str =
    r#"function(){("INPUT"===this.nodeName||"TEXTAREA"===this.nodeName)?this.value="":this.innerText=""}"#;

/// Returns the element's value or inner text.
pub(crate) const GET_INNER_TEXT: &str = r#"function(){return this.value||this.innerText}"#;

/// Dispatches a list of bubbling events on the element.
pub(crate) const DISPATCH_EVENTS: &str =
    r#"function(l){for(const e of l)this.dispatchEvent(new Event(e,{'bubbles':!0}))}"#;

/// Selects the options whose values are in the given list.
pub(crate) const SELECT: &str = r#"function(a){const b=Array.from(this.options);this.value=void 0;for(const c of b)if(c.selected=a.includes(c.value),c.selected&&!this.multiple)break}"#;

/// Returns the values of the selected options.
pub(crate) const GET_SELECTED: &str =
    r#"function(){return Array.from(this.options).filter(a=>a.selected).map(a=>a.value)}"#;

/// Returns the labels of the selected options.
pub(crate) const GET_SELECTED_TEXT: &str =
    r#"function(){return Array.from(this.options).filter(a=>a.selected).map(a=>a.innerText)}"#;

/// Checks that every requested value exists among the options.
pub(crate) const SELECT_CONTAINS: &str = r#"function(c){const a=Array.from(this.options);return c.length==a.filter(a=>c.includes(a.value)).length}"#;

/// Sets the checked flag.
pub(crate) const CHECKBOX: &str = r#"function(c){this.checked=c}"#;

/// Reads the checked flag.
pub(crate) const CHECKED: &str = r#"function(){return this.checked}"#;

/// Reads one computed style property.
pub(crate) const GET_COMPUTED_STYLE: &str = r#"function(s){return getComputedStyle(this)[s]}"#;

/// Sets an attribute.
pub(crate) const SET_ATTR: &str = r#"function(a,v){this.setAttribute(a,v)}"#;

/// Reads an attribute.
pub(crate) const GET_ATTR: &str = r#"function(a){return this.getAttribute(a)}"#;

/// Visibility heuristic: rendered box and not `visibility:hidden`.
pub(crate) const IS_VISIBLE: &str = r#"function(){const b=this.getBoundingClientRect(),c=window.getComputedStyle(this);return c&&"hidden"!==c.visibility&&!c.disabled&&!!(b.top||b.bottom||b.width||b.height)}"#;

/// Reads the miss-click expando flag set by [`PREVENT_MISS_CLICK`].
pub(crate) const CLICK_DONE: &str = r#"function(){return this._cc}"#;

/// Installs a one-shot capture-phase click listener that flips the expando
/// flag only when the hit-tested node is `this` or a descendant. Clicks
/// landing on overlays are suppressed and leave the flag false.
pub(crate) const PREVENT_MISS_CLICK: &str = r#"function(){this._cc=!1,tt=this,z=function(b){for(var c=b;c;c=c.parentNode)if(c==tt)return!0;return!1},i=function(b){if (z(b.target)) {tt._cc=!0;} else {b.stopPropagation();b.preventDefault()}},document.addEventListener("click",i,{capture:!0,once:!0})}"#;

/// One-shot MutationObserver promise resolving with the first mutation type.
pub(crate) const MUTATION_OBSERVER: &str = r#"function(b,d,c){return new Promise(e=>{const f=new MutationObserver(b=>{for(var c of b){e(c.type),f.disconnect();break}});f.observe(this,{attributes:b,childList:d,subtree:c})})}"#;

/// Element-scoped `querySelector`.
pub(crate) const QUERY_SELECTOR: &str = r#"function(s){return this.querySelector(s)}"#;

/// Element-scoped `querySelectorAll`.
pub(crate) const QUERY_SELECTOR_ALL: &str = r#"function(s){return this.querySelectorAll(s)}"#;
