// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A debug-only checker that every node ID in a tree is assigned and unique. This is run by
//! test builders after construction, the way a parser's assigner pass would be checked in a
//! full pipeline.

use crate::{
    ast::{
        Alias, Attribute, BasicLit, BinaryExpr, CallExpr, CommentGroup, Comprehension,
        EmbedDecl, Ellipsis, Expr, Field, File, ForClause, Ident, IfClause, ImportDecl,
        ImportSpec, IndexExpr, Interpolation, Label, NodeId, Package, ParenExpr, PostfixExpr,
        SelectorExpr, StructLit, UnaryExpr,
    },
    visit::{self, Visitor},
};
use cue_data_structures::index_map::IndexMap;
use std::fmt::Display;

#[derive(Default)]
pub struct Validator {
    ids: IndexMap<NodeId, ()>,
}

impl Validator {
    fn check(&mut self, id: NodeId, node: impl Display) {
        if id.is_default() {
            panic!("default node ID should be replaced: {node}")
        } else if self.ids.contains_key(id) {
            panic!("duplicate node ID: {node}");
        } else {
            self.ids.insert(id, ());
        }
    }
}

impl Visitor<'_> for Validator {
    fn visit_file(&mut self, file: &File) {
        self.check(file.id, file);
        visit::walk_file(self, file);
    }

    fn visit_package(&mut self, package: &Package) {
        self.check(package.id, package);
        visit::walk_package(self, package);
    }

    fn visit_import_decl(&mut self, decl: &ImportDecl) {
        self.check(decl.id, decl);
        visit::walk_import_decl(self, decl);
    }

    fn visit_import_spec(&mut self, spec: &ImportSpec) {
        self.check(spec.id, spec);
        visit::walk_import_spec(self, spec);
    }

    fn visit_field(&mut self, field: &Field) {
        self.check(field.id, field);
        visit::walk_field(self, field);
    }

    fn visit_label(&mut self, label: &Label) {
        self.check(label.id, label);
        visit::walk_label(self, label);
    }

    fn visit_embed_decl(&mut self, decl: &EmbedDecl) {
        self.check(decl.id, decl);
        visit::walk_embed_decl(self, decl);
    }

    fn visit_alias(&mut self, alias: &Alias) {
        self.check(alias.id, alias);
        visit::walk_alias(self, alias);
    }

    fn visit_ellipsis(&mut self, ellipsis: &Ellipsis) {
        self.check(ellipsis.id, ellipsis);
        visit::walk_ellipsis(self, ellipsis);
    }

    fn visit_attribute(&mut self, attr: &Attribute) {
        self.check(attr.id, attr);
        visit::walk_attribute(self, attr);
    }

    fn visit_comment_group(&mut self, docs: &CommentGroup) {
        self.check(docs.id, docs);
    }

    fn visit_struct_lit(&mut self, lit: &StructLit) {
        self.check(lit.id, lit);
        visit::walk_struct_lit(self, lit);
    }

    fn visit_list_lit(&mut self, lit: &crate::ast::ListLit) {
        self.check(lit.id, lit);
        visit::walk_list_lit(self, lit);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        self.check(expr.id(), expr);
        visit::walk_expr(self, expr);
    }

    fn visit_ident(&mut self, ident: &Ident) {
        self.check(ident.id, ident);
    }

    fn visit_basic_lit(&mut self, lit: &BasicLit) {
        self.check(lit.id, lit);
    }

    fn visit_interpolation(&mut self, interp: &Interpolation) {
        self.check(interp.id, interp);
        visit::walk_interpolation(self, interp);
    }

    fn visit_paren_expr(&mut self, expr: &ParenExpr) {
        self.check(expr.id, expr);
        visit::walk_paren_expr(self, expr);
    }

    fn visit_unary_expr(&mut self, expr: &UnaryExpr) {
        self.check(expr.id, expr);
        visit::walk_unary_expr(self, expr);
    }

    fn visit_binary_expr(&mut self, expr: &BinaryExpr) {
        self.check(expr.id, expr);
        visit::walk_binary_expr(self, expr);
    }

    fn visit_call_expr(&mut self, expr: &CallExpr) {
        self.check(expr.id, expr);
        visit::walk_call_expr(self, expr);
    }

    fn visit_selector_expr(&mut self, expr: &SelectorExpr) {
        self.check(expr.id, expr);
        visit::walk_selector_expr(self, expr);
    }

    fn visit_index_expr(&mut self, expr: &IndexExpr) {
        self.check(expr.id, expr);
        visit::walk_index_expr(self, expr);
    }

    fn visit_postfix_expr(&mut self, expr: &PostfixExpr) {
        self.check(expr.id, expr);
        visit::walk_postfix_expr(self, expr);
    }

    fn visit_comprehension(&mut self, comp: &Comprehension) {
        self.check(comp.id, comp);
        visit::walk_comprehension(self, comp);
    }
}

#[cfg(test)]
mod tests {
    use super::Validator;
    use crate::{builder, visit::Visitor};
    use cue_data_structures::span::Span;

    #[test]
    fn builder_output_has_unique_non_default_ids() {
        let mut b = builder::Builder::new();
        // foo: 3
        let foo = b.ident("foo", Span::new(0, 3));
        let label = b.label_ident(foo);
        let three = b.int("3", Span::new(5, 6));
        let value = b.lit_expr(three);
        let field = b.field(label, value, Span::new(0, 6));
        let file = b.file("a.cue", None, vec![field], Span::new(0, 7));
        Validator::default().visit_file(&file);
    }
}
