// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write-side operations, grouped by entity. All timestamps arrive as
//! preformatted ISO-8601 strings from the service layer.

pub mod events;
pub mod mappings;
pub mod operators;
pub mod orgs;
pub mod sessions;
pub mod teams;
