// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{
    Alias, Attribute, BasicLit, BinaryExpr, CallExpr, Clause, CommentGroup, Comprehension, Decl,
    EmbedDecl, Ellipsis, Expr, Field, File, ForClause, Ident, IfClause, ImportDecl, ImportSpec,
    IndexExpr, Interpolation, Label, LabelKind, LetClause, ListLit, Package, ParenExpr,
    PostfixExpr, Selector, SelectorExpr, StringComponent, StructLit, UnaryExpr,
};

/// A read-only traversal over a CUE AST.
///
/// Every method has a default implementation that walks into the node's children; override
/// only the ones a particular pass cares about.
pub trait Visitor<'a>: Sized {
    fn visit_file(&mut self, file: &'a File) {
        walk_file(self, file);
    }

    fn visit_package(&mut self, package: &'a Package) {
        walk_package(self, package);
    }

    fn visit_decl(&mut self, decl: &'a Decl) {
        walk_decl(self, decl);
    }

    fn visit_import_decl(&mut self, decl: &'a ImportDecl) {
        walk_import_decl(self, decl);
    }

    fn visit_import_spec(&mut self, spec: &'a ImportSpec) {
        walk_import_spec(self, spec);
    }

    fn visit_field(&mut self, field: &'a Field) {
        walk_field(self, field);
    }

    fn visit_label(&mut self, label: &'a Label) {
        walk_label(self, label);
    }

    fn visit_embed_decl(&mut self, decl: &'a EmbedDecl) {
        walk_embed_decl(self, decl);
    }

    fn visit_alias(&mut self, alias: &'a Alias) {
        walk_alias(self, alias);
    }

    fn visit_ellipsis(&mut self, ellipsis: &'a Ellipsis) {
        walk_ellipsis(self, ellipsis);
    }

    fn visit_attribute(&mut self, attr: &'a Attribute) {
        walk_attribute(self, attr);
    }

    fn visit_comment_group(&mut self, _: &'a CommentGroup) {}

    fn visit_struct_lit(&mut self, lit: &'a StructLit) {
        walk_struct_lit(self, lit);
    }

    fn visit_list_lit(&mut self, lit: &'a ListLit) {
        walk_list_lit(self, lit);
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        walk_expr(self, expr);
    }

    fn visit_ident(&mut self, _: &'a Ident) {}

    fn visit_basic_lit(&mut self, _: &'a BasicLit) {}

    fn visit_interpolation(&mut self, interp: &'a Interpolation) {
        walk_interpolation(self, interp);
    }

    fn visit_paren_expr(&mut self, expr: &'a ParenExpr) {
        walk_paren_expr(self, expr);
    }

    fn visit_unary_expr(&mut self, expr: &'a UnaryExpr) {
        walk_unary_expr(self, expr);
    }

    fn visit_binary_expr(&mut self, expr: &'a BinaryExpr) {
        walk_binary_expr(self, expr);
    }

    fn visit_call_expr(&mut self, expr: &'a CallExpr) {
        walk_call_expr(self, expr);
    }

    fn visit_selector_expr(&mut self, expr: &'a SelectorExpr) {
        walk_selector_expr(self, expr);
    }

    fn visit_index_expr(&mut self, expr: &'a IndexExpr) {
        walk_index_expr(self, expr);
    }

    fn visit_postfix_expr(&mut self, expr: &'a PostfixExpr) {
        walk_postfix_expr(self, expr);
    }

    fn visit_comprehension(&mut self, comp: &'a Comprehension) {
        walk_comprehension(self, comp);
    }

    fn visit_clause(&mut self, clause: &'a Clause) {
        walk_clause(self, clause);
    }

    fn visit_for_clause(&mut self, clause: &'a ForClause) {
        walk_for_clause(self, clause);
    }

    fn visit_if_clause(&mut self, clause: &'a IfClause) {
        walk_if_clause(self, clause);
    }

    fn visit_let_clause(&mut self, clause: &'a LetClause) {
        walk_let_clause(self, clause);
    }
}

pub fn walk_file<'a>(vis: &mut impl Visitor<'a>, file: &'a File) {
    if let Some(package) = &file.package {
        vis.visit_package(package);
    }
    file.decls.iter().for_each(|d| vis.visit_decl(d));
}

pub fn walk_package<'a>(vis: &mut impl Visitor<'a>, package: &'a Package) {
    if let Some(name) = &package.name {
        vis.visit_ident(name);
    }
}

pub fn walk_decl<'a>(vis: &mut impl Visitor<'a>, decl: &'a Decl) {
    match decl {
        Decl::Field(field) => vis.visit_field(field),
        Decl::Embed(embed) => vis.visit_embed_decl(embed),
        Decl::Alias(alias) => vis.visit_alias(alias),
        Decl::Import(import) => vis.visit_import_decl(import),
        Decl::Attribute(attr) => vis.visit_attribute(attr),
        Decl::Ellipsis(ellipsis) => vis.visit_ellipsis(ellipsis),
        Decl::Comprehension(comp) => vis.visit_comprehension(comp),
        Decl::Err(..) => {}
    }
}

pub fn walk_import_decl<'a>(vis: &mut impl Visitor<'a>, decl: &'a ImportDecl) {
    decl.specs.iter().for_each(|s| vis.visit_import_spec(s));
}

pub fn walk_import_spec<'a>(vis: &mut impl Visitor<'a>, spec: &'a ImportSpec) {
    if let Some(alias) = &spec.alias {
        vis.visit_ident(alias);
    }
    vis.visit_basic_lit(&spec.path);
}

pub fn walk_field<'a>(vis: &mut impl Visitor<'a>, field: &'a Field) {
    vis.visit_label(&field.label);
    vis.visit_expr(&field.value);
    field.attributes.iter().for_each(|a| vis.visit_attribute(a));
    if let Some(docs) = &field.docs {
        vis.visit_comment_group(docs);
    }
}

pub fn walk_label<'a>(vis: &mut impl Visitor<'a>, label: &'a Label) {
    if let Some(alias) = &label.alias {
        vis.visit_ident(alias);
    }
    match &label.kind {
        LabelKind::Ident(ident) => vis.visit_ident(ident),
        LabelKind::String(lit) | LabelKind::Numeric(lit) => vis.visit_basic_lit(lit),
        LabelKind::Paren(expr) => vis.visit_expr(expr),
    }
}

pub fn walk_embed_decl<'a>(vis: &mut impl Visitor<'a>, decl: &'a EmbedDecl) {
    vis.visit_expr(&decl.expr);
}

pub fn walk_alias<'a>(vis: &mut impl Visitor<'a>, alias: &'a Alias) {
    vis.visit_ident(&alias.ident);
    vis.visit_expr(&alias.expr);
}

pub fn walk_ellipsis<'a>(vis: &mut impl Visitor<'a>, ellipsis: &'a Ellipsis) {
    if let Some(ty) = &ellipsis.ty {
        vis.visit_expr(ty);
    }
}

pub fn walk_attribute<'a>(vis: &mut impl Visitor<'a>, attr: &'a Attribute) {
    vis.visit_ident(&attr.name);
}

pub fn walk_struct_lit<'a>(vis: &mut impl Visitor<'a>, lit: &'a StructLit) {
    lit.elements.iter().for_each(|d| vis.visit_decl(d));
}

pub fn walk_list_lit<'a>(vis: &mut impl Visitor<'a>, lit: &'a ListLit) {
    lit.elements.iter().for_each(|e| vis.visit_expr(e));
}

pub fn walk_expr<'a>(vis: &mut impl Visitor<'a>, expr: &'a Expr) {
    match expr {
        Expr::Struct(lit) => vis.visit_struct_lit(lit),
        Expr::List(lit) => vis.visit_list_lit(lit),
        Expr::Ident(ident) => vis.visit_ident(ident),
        Expr::Lit(lit) => vis.visit_basic_lit(lit),
        Expr::Interpolation(interp) => vis.visit_interpolation(interp),
        Expr::Paren(e) => vis.visit_paren_expr(e),
        Expr::Unary(e) => vis.visit_unary_expr(e),
        Expr::Binary(e) => vis.visit_binary_expr(e),
        Expr::Call(e) => vis.visit_call_expr(e),
        Expr::Selector(e) => vis.visit_selector_expr(e),
        Expr::Index(e) => vis.visit_index_expr(e),
        Expr::Postfix(e) => vis.visit_postfix_expr(e),
        Expr::Ellipsis(e) => vis.visit_ellipsis(e),
        Expr::Comprehension(c) => vis.visit_comprehension(c),
        Expr::Alias(a) => vis.visit_alias(a),
        Expr::Err(..) => {}
    }
}

pub fn walk_interpolation<'a>(vis: &mut impl Visitor<'a>, interp: &'a Interpolation) {
    for component in &interp.components {
        if let StringComponent::Expr(expr) = component {
            vis.visit_expr(expr);
        }
    }
}

pub fn walk_paren_expr<'a>(vis: &mut impl Visitor<'a>, expr: &'a ParenExpr) {
    vis.visit_expr(&expr.expr);
}

pub fn walk_unary_expr<'a>(vis: &mut impl Visitor<'a>, expr: &'a UnaryExpr) {
    vis.visit_expr(&expr.expr);
}

pub fn walk_binary_expr<'a>(vis: &mut impl Visitor<'a>, expr: &'a BinaryExpr) {
    vis.visit_expr(&expr.lhs);
    vis.visit_expr(&expr.rhs);
}

pub fn walk_call_expr<'a>(vis: &mut impl Visitor<'a>, expr: &'a CallExpr) {
    vis.visit_expr(&expr.callee);
    expr.args.iter().for_each(|a| vis.visit_expr(a));
}

pub fn walk_selector_expr<'a>(vis: &mut impl Visitor<'a>, expr: &'a SelectorExpr) {
    vis.visit_expr(&expr.expr);
    match &expr.sel {
        Selector::Ident(ident) => vis.visit_ident(ident),
        Selector::String(lit) => vis.visit_basic_lit(lit),
    }
}

pub fn walk_index_expr<'a>(vis: &mut impl Visitor<'a>, expr: &'a IndexExpr) {
    vis.visit_expr(&expr.expr);
    vis.visit_expr(&expr.index);
}

pub fn walk_postfix_expr<'a>(vis: &mut impl Visitor<'a>, expr: &'a PostfixExpr) {
    vis.visit_expr(&expr.expr);
}

pub fn walk_comprehension<'a>(vis: &mut impl Visitor<'a>, comp: &'a Comprehension) {
    comp.clauses.iter().for_each(|c| vis.visit_clause(c));
    vis.visit_struct_lit(&comp.value);
}

pub fn walk_clause<'a>(vis: &mut impl Visitor<'a>, clause: &'a Clause) {
    match clause {
        Clause::For(c) => vis.visit_for_clause(c),
        Clause::If(c) => vis.visit_if_clause(c),
        Clause::Let(c) => vis.visit_let_clause(c),
    }
}

pub fn walk_for_clause<'a>(vis: &mut impl Visitor<'a>, clause: &'a ForClause) {
    if let Some(key) = &clause.key {
        vis.visit_ident(key);
    }
    vis.visit_ident(&clause.value);
    vis.visit_expr(&clause.source);
}

pub fn walk_if_clause<'a>(vis: &mut impl Visitor<'a>, clause: &'a IfClause) {
    vis.visit_expr(&clause.cond);
}

pub fn walk_let_clause<'a>(vis: &mut impl Visitor<'a>, clause: &'a LetClause) {
    vis.visit_ident(&clause.ident);
    vis.visit_expr(&clause.expr);
}
